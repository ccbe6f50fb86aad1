use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

const LOCAL_ID_PREFIX: &str = "local-";

/// Identifiers arrive from the backend as numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Opaque sighting identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SightingId(String);

impl SightingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A temporary client-side id, used until (or instead of) a backend-assigned one.
    pub fn local() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4()))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SightingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SightingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for SightingId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SightingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

/// Owner reference. Held by value; deleting a user does not touch their sightings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

/// Coarse taxonomic grouping. Ordering follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Mammal,
    Bird,
    Reptile,
    Amphibian,
    Fish,
    Insect,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Mammal,
        Category::Bird,
        Category::Reptile,
        Category::Amphibian,
        Category::Fish,
        Category::Insect,
        Category::Other,
    ];

    /// Lenient parse: anything unrecognized, including an empty string, is `Other`.
    pub fn normalize(raw: &str) -> Self {
        raw.parse().unwrap_or(Category::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Mammal => "Mammal",
            Category::Bird => "Bird",
            Category::Reptile => "Reptile",
            Category::Amphibian => "Amphibian",
            Category::Fish => "Fish",
            Category::Insect => "Insect",
            Category::Other => "Other",
        }
    }

    /// Display color used for map pins and gallery headers.
    pub fn color(self) -> &'static str {
        match self {
            Category::Mammal => "#E53935",
            Category::Bird => "#1E88E5",
            Category::Reptile => "#43A047",
            Category::Amphibian => "#8E24AA",
            Category::Fish => "#00ACC1",
            Category::Insect => "#FFB300",
            Category::Other => "#757575",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown category: {trimmed:?}"))
    }
}

/// What the animal was doing when observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    Resting,
    Feeding,
    Moving,
    Nesting,
    Swimming,
    Flying,
    Unknown,
}

impl Behavior {
    pub const ALL: [Behavior; 7] = [
        Behavior::Resting,
        Behavior::Feeding,
        Behavior::Moving,
        Behavior::Nesting,
        Behavior::Swimming,
        Behavior::Flying,
        Behavior::Unknown,
    ];

    /// Empty or unrecognized text means no behavior was recorded.
    pub fn parse_optional(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Behavior::Resting => "Resting",
            Behavior::Feeding => "Feeding",
            Behavior::Moving => "Moving",
            Behavior::Nesting => "Nesting",
            Behavior::Swimming => "Swimming",
            Behavior::Flying => "Flying",
            Behavior::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Behavior::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown behavior: {trimmed:?}"))
    }
}

/// A single logged wildlife observation. Replaced wholesale on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub id: SightingId,
    pub user_id: Option<UserId>,
    /// Owner's display name; the backend keys ownership on it.
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub animal_name: String,
    pub category: Category,
    pub quantity: u32,
    pub behavior: Option<Behavior>,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub photo_url: Option<String>,
}

impl Default for Sighting {
    fn default() -> Self {
        Self {
            id: SightingId::local(),
            user_id: None,
            username: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            address: String::new(),
            animal_name: String::new(),
            category: Category::Other,
            quantity: 1,
            behavior: None,
            description: String::new(),
            date: None,
            time: None,
            photo_url: None,
        }
    }
}

impl Sighting {
    /// A new, not yet synced sighting carrying a local id.
    pub fn draft(animal_name: impl Into<String>, category: Category) -> Self {
        Self {
            animal_name: animal_name.into(),
            category,
            ..Self::default()
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id.as_ref() == Some(user_id)
    }

    /// Owned by this account: matching id, or matching username on a row the backend
    /// returned without an owner id.
    pub fn is_owned_by_account(&self, user_id: &UserId, username: &str) -> bool {
        match &self.user_id {
            Some(owner) => owner == user_id,
            None => !username.is_empty() && self.username == username,
        }
    }

    /// Merge the fields set in `patch`, leaving everything else as it was.
    pub fn apply(&mut self, patch: &SightingPatch) {
        if let Some(latitude) = patch.latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = patch.longitude {
            self.longitude = longitude;
        }
        if let Some(address) = &patch.address {
            self.address = address.clone();
        }
        if let Some(animal_name) = &patch.animal_name {
            self.animal_name = animal_name.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity.max(1);
        }
        if let Some(behavior) = patch.behavior {
            self.behavior = behavior;
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(photo_url) = &patch.photo_url {
            self.photo_url = photo_url.clone();
        }
    }
}

/// Partial update for a sighting. `None` leaves a field untouched; for the optional
/// fields `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SightingPatch {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub animal_name: Option<String>,
    pub category: Option<Category>,
    pub quantity: Option<u32>,
    pub behavior: Option<Option<Behavior>>,
    pub description: Option<String>,
    pub date: Option<Option<NaiveDate>>,
    pub time: Option<Option<NaiveTime>>,
    pub photo_url: Option<Option<String>>,
}

impl SightingPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

pub(crate) fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

pub(crate) fn format_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub(crate) fn non_empty(raw: String) -> Option<String> {
    if raw.trim().is_empty() { None } else { Some(raw) }
}

/// A sighting as the backend returns it from `GET /sightings`.
#[derive(Debug, Clone, Deserialize)]
pub struct SightingRow {
    pub id: SightingId,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
}

impl From<SightingRow> for Sighting {
    fn from(row: SightingRow) -> Self {
        let quantity = row
            .quantity
            .filter(|&q| q >= 1)
            .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
            .unwrap_or(1);

        Self {
            id: row.id,
            // user_id 0 marks an unowned row
            user_id: row
                .user_id
                .filter(|u| !u.as_str().is_empty() && u.as_str() != "0"),
            username: row.username.unwrap_or_default(),
            latitude: row.latitude,
            longitude: row.longitude,
            address: row.address.unwrap_or_default(),
            animal_name: row.species,
            category: Category::normalize(row.category.as_deref().unwrap_or_default()),
            quantity,
            behavior: row.behavior.as_deref().and_then(Behavior::parse_optional),
            description: row.description.unwrap_or_default(),
            date: row.date.as_deref().and_then(parse_date),
            time: row.time.as_deref().and_then(parse_time),
            photo_url: row.image_url.and_then(non_empty),
        }
    }
}

/// Body of `POST /sightings` and `PUT /sightings/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct SightingPayload {
    pub species: String,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub category: String,
    pub quantity: u32,
    pub behavior: String,
    pub description: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
}

impl From<&Sighting> for SightingPayload {
    fn from(s: &Sighting) -> Self {
        Self {
            species: s.animal_name.clone(),
            image_url: s.photo_url.clone().unwrap_or_default(),
            latitude: s.latitude,
            longitude: s.longitude,
            address: s.address.clone(),
            category: s.category.to_string(),
            quantity: s.quantity,
            behavior: s.behavior.map(|b| b.to_string()).unwrap_or_default(),
            description: s.description.clone(),
            date: format_date(s.date),
            time: format_time(s.time),
            user_id: s
                .user_id
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_default(),
            username: s.username.clone(),
        }
    }
}

/// Response of `POST /sightings`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedId {
    pub id: SightingId,
}
