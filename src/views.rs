//! Read-only projections of the sighting collection.
//!
//! Everything here is a pure function of a slice of sightings and is recomputed on
//! every call; the collections involved are small enough that nothing is cached.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::record::{Category, Sighting, UserId};

/// Total observed individuals of one species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesCount {
    pub name: String,
    pub count: u64,
}

/// Everything the species and photo galleries show for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: Category,
    pub sightings: usize,
    pub species: Vec<SpeciesCount>,
    pub cover_photo: Option<String>,
}

/// Profile statistics for a set of sightings (usually one user's).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total: usize,
    pub unique_species: usize,
    pub unique_locations: usize,
    pub top_category: Option<Category>,
}

/// Partition sightings by category, keeping collection order inside each group.
/// Categories without sightings are absent.
pub fn grouped_by_category(sightings: &[Sighting]) -> BTreeMap<Category, Vec<&Sighting>> {
    let mut groups: BTreeMap<Category, Vec<&Sighting>> = BTreeMap::new();
    for sighting in sightings {
        groups.entry(sighting.category).or_default().push(sighting);
    }
    groups
}

pub fn owned_by<'a>(sightings: &'a [Sighting], user_id: &UserId) -> Vec<&'a Sighting> {
    sightings.iter().filter(|s| s.is_owned_by(user_id)).collect()
}

/// Sum quantities per species name within `category`, in order of first appearance.
pub fn species_tally(sightings: &[Sighting], category: Category) -> Vec<SpeciesCount> {
    tally(sightings.iter().filter(|s| s.category == category))
}

fn tally<'a>(sightings: impl IntoIterator<Item = &'a Sighting>) -> Vec<SpeciesCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<SpeciesCount> = Vec::new();

    for sighting in sightings {
        let quantity = u64::from(sighting.quantity);
        match index.get(sighting.animal_name.as_str()) {
            Some(&i) => counts[i].count += quantity,
            None => {
                index.insert(&sighting.animal_name, counts.len());
                counts.push(SpeciesCount {
                    name: sighting.animal_name.clone(),
                    count: quantity,
                });
            }
        }
    }

    counts
}

/// Photo of the first sighting in `category` that has one.
pub fn cover_photo(sightings: &[Sighting], category: Category) -> Option<&str> {
    sightings
        .iter()
        .filter(|s| s.category == category)
        .find_map(|s| s.photo_url.as_deref())
}

pub fn category_summaries(sightings: &[Sighting]) -> Vec<CategorySummary> {
    grouped_by_category(sightings)
        .into_iter()
        .map(|(category, members)| CategorySummary {
            category,
            sightings: members.len(),
            cover_photo: members
                .iter()
                .find_map(|s| s.photo_url.clone()),
            species: tally(members),
        })
        .collect()
}

pub fn user_stats<'a>(sightings: impl IntoIterator<Item = &'a Sighting>) -> UserStats {
    let mut total = 0;
    let mut species = HashSet::new();
    let mut locations = HashSet::new();
    // first-seen order decides ties
    let mut category_counts: Vec<(Category, usize)> = Vec::new();

    for sighting in sightings {
        total += 1;
        species.insert(sighting.animal_name.as_str());
        locations.insert(sighting.address.as_str());
        match category_counts
            .iter_mut()
            .find(|(c, _)| *c == sighting.category)
        {
            Some((_, n)) => *n += 1,
            None => category_counts.push((sighting.category, 1)),
        }
    }

    let mut top_category = None;
    let mut top_count = 0;
    for (category, count) in category_counts {
        if count > top_count {
            top_category = Some(category);
            top_count = count;
        }
    }

    UserStats {
        total,
        unique_species: species.len(),
        unique_locations: locations.len(),
        top_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(name: &str, category: Category, quantity: u32) -> Sighting {
        Sighting {
            quantity,
            ..Sighting::draft(name, category)
        }
    }

    #[test]
    fn test_unknown_category_groups_under_other() {
        let sightings = vec![
            sighting("Mystery", Category::normalize(""), 1),
            sighting("Chupacabra", Category::normalize("Cryptid"), 1),
            sighting("Hawk", Category::Bird, 1),
        ];
        let groups = grouped_by_category(&sightings);

        assert_eq!(groups[&Category::Other].len(), 2);
        assert_eq!(groups[&Category::Bird].len(), 1);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_grouping_preserves_insertion_order() {
        let sightings = vec![
            sighting("Hawk", Category::Bird, 1),
            sighting("Gator", Category::Reptile, 1),
            sighting("Owl", Category::Bird, 1),
        ];
        let groups = grouped_by_category(&sightings);
        let birds: Vec<_> = groups[&Category::Bird]
            .iter()
            .map(|s| s.animal_name.as_str())
            .collect();

        assert_eq!(birds, vec!["Hawk", "Owl"]);
    }

    #[test]
    fn test_empty_collection_has_no_groups() {
        assert!(grouped_by_category(&[]).is_empty());
        assert!(owned_by(&[], &UserId::new("u1")).is_empty());
        assert!(category_summaries(&[]).is_empty());
    }

    #[test]
    fn test_species_tally_sums_quantity() {
        let sightings = vec![
            sighting("Hawk", Category::Bird, 2),
            sighting("Hawk", Category::Bird, 3),
        ];
        assert_eq!(
            species_tally(&sightings, Category::Bird),
            vec![SpeciesCount {
                name: "Hawk".to_string(),
                count: 5
            }]
        );
    }

    #[test]
    fn test_species_tally_first_appearance_order() {
        let sightings = vec![
            sighting("Owl", Category::Bird, 1),
            sighting("Gator", Category::Reptile, 4),
            sighting("Hawk", Category::Bird, 2),
            sighting("Owl", Category::Bird, 1),
        ];
        let names: Vec<_> = species_tally(&sightings, Category::Bird)
            .into_iter()
            .map(|c| (c.name, c.count))
            .collect();

        assert_eq!(names, vec![("Owl".to_string(), 2), ("Hawk".to_string(), 2)]);
        assert!(species_tally(&sightings, Category::Fish).is_empty());
    }

    #[test]
    fn test_cover_photo() {
        let mut first = sighting("Hawk", Category::Bird, 1);
        let mut second = sighting("Owl", Category::Bird, 1);
        second.photo_url = Some("https://img/owl.jpg".to_string());
        let mut third = sighting("Crane", Category::Bird, 1);
        third.photo_url = Some("https://img/crane.jpg".to_string());
        let sightings = vec![first.clone(), second, third];

        assert_eq!(
            cover_photo(&sightings, Category::Bird),
            Some("https://img/owl.jpg")
        );

        first.photo_url = None;
        assert_eq!(cover_photo(&[first], Category::Bird), None);
        assert_eq!(cover_photo(&sightings, Category::Mammal), None);
    }

    #[test]
    fn test_category_summaries() {
        let mut gator = sighting("Gator", Category::Reptile, 1);
        gator.photo_url = Some("https://img/gator.jpg".to_string());
        let sightings = vec![
            sighting("Hawk", Category::Bird, 2),
            gator,
            sighting("Hawk", Category::Bird, 1),
        ];
        let summaries = category_summaries(&sightings);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].category, Category::Bird);
        assert_eq!(summaries[0].sightings, 2);
        assert_eq!(summaries[0].species[0].count, 3);
        assert_eq!(summaries[0].cover_photo, None);
        assert_eq!(
            summaries[1].cover_photo.as_deref(),
            Some("https://img/gator.jpg")
        );
    }

    #[test]
    fn test_user_stats() {
        let mut a = sighting("Hawk", Category::Bird, 1);
        a.address = "Lake Alice".to_string();
        let mut b = sighting("Gator", Category::Reptile, 1);
        b.address = "Lake Alice".to_string();
        let mut c = sighting("Turtle", Category::Reptile, 1);
        c.address = "Bat House".to_string();
        let mut d = sighting("Hawk", Category::Bird, 1);
        d.address = "Bat House".to_string();

        let stats = user_stats(&[a, b, c, d]);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.unique_species, 3);
        assert_eq!(stats.unique_locations, 2);
        // Bird and Reptile tie at two; Bird was seen first
        assert_eq!(stats.top_category, Some(Category::Bird));
    }

    #[test]
    fn test_user_stats_empty() {
        assert_eq!(user_stats(&Vec::<Sighting>::new()), UserStats::default());
    }
}
