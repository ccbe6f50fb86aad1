mod parse;

use crate::parse::{AddArgs, Args, Command, UpdateArgs};
use chrono::{Local, NaiveTime, Timelike};
use clap::Parser;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use wildlife_tracker::record::{parse_date, parse_time};
use wildlife_tracker::views::{category_summaries, user_stats};
use wildlife_tracker::{
    ApiError, Behavior, Category, Config, HttpBackend, ObjectStorage, SessionStore, Sighting,
    SightingId, SightingPatch, SightingStore, SignupRequest, SyncOutcome, User, upload_photo,
};

/// Sighting from the `add` arguments, owned by `user`. Date and time default to now,
/// the time to the current minute.
pub fn build_draft(args: &AddArgs, user: &User) -> Sighting {
    let now = Local::now();
    Sighting {
        user_id: Some(user.id.clone()),
        username: user.username.clone(),
        latitude: args.lat,
        longitude: args.lon,
        address: args.address.clone(),
        quantity: args.quantity.max(1),
        behavior: args.behavior.as_deref().and_then(Behavior::parse_optional),
        description: args.description.clone(),
        date: match &args.date {
            Some(raw) => parse_date(raw),
            None => Some(now.date_naive()),
        },
        time: match &args.time {
            Some(raw) => parse_time(raw),
            None => NaiveTime::from_hms_opt(now.hour(), now.minute(), 0),
        },
        ..Sighting::draft(args.species.clone(), Category::normalize(&args.category))
    }
}

/// Patch from the `update` arguments. Photo changes are filled in separately.
pub fn build_patch(args: &UpdateArgs) -> SightingPatch {
    SightingPatch {
        animal_name: args.species.clone(),
        category: args.category.as_deref().map(Category::normalize),
        quantity: args.quantity,
        behavior: args
            .behavior
            .as_deref()
            .map(Behavior::parse_optional),
        description: args.description.clone(),
        photo_url: args.clear_photo.then_some(None),
        ..SightingPatch::default()
    }
}

fn outcome_note(outcome: SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Confirmed => "",
        SyncOutcome::LocalOnly => " (not saved on server)",
    }
}

pub fn print_sightings(records: &[Sighting]) {
    if records.is_empty() {
        println!("No sightings");
        return;
    }

    for s in records {
        let when = [
            s.date.map(|d| d.to_string()).unwrap_or_default(),
            s.time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
        ]
        .join(" ");
        println!(
            "{:>8}  {:<10} {:<24} x{:<3} {:<16} {}",
            s.id,
            s.category,
            s.animal_name,
            s.quantity,
            when.trim(),
            s.address
        );
    }
}

pub fn print_species(records: &[Sighting]) {
    let summaries = category_summaries(records);
    if summaries.is_empty() {
        println!("No sightings to summarize");
        return;
    }

    for summary in summaries {
        println!(
            "\n{} [{}] - {} sightings",
            summary.category,
            summary.category.color(),
            summary.sightings
        );
        for species in summary.species {
            println!("  {}: {}", species.name, species.count);
        }
    }
}

pub fn print_photos(records: &[Sighting]) {
    let summaries = category_summaries(records);
    if summaries.is_empty() {
        println!("No sightings");
        return;
    }

    for summary in summaries {
        println!(
            "{:<10} {}",
            summary.category,
            summary.cover_photo.as_deref().unwrap_or("(no photo)")
        );
    }
}

pub fn print_profile(user: &User, records: &[Sighting]) {
    let stats = user_stats(records);
    println!("{} <{}>", user.username, user.email);
    println!("Role: {}  Joined: {}", user.role, user.join_date);
    println!("\nSummary:");
    println!("Total sightings: {}", stats.total);
    println!("Unique species: {}", stats.unique_species);
    println!("Unique locations: {}", stats.unique_locations);
    println!(
        "Top category: {}",
        stats
            .top_category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    );
}

async fn sign_in(sessions: &SessionStore<HttpBackend>, args: &Args) -> Result<User, ApiError> {
    match (&args.email, &args.password) {
        (Some(email), Some(password)) => sessions.login(email, password).await,
        _ => Err(ApiError::NotLoggedIn),
    }
}

/// Upload any photo that points at a local file, at most `concurrent` at a time.
async fn upload_local_photos(drafts: &mut [Sighting], config: &Config, concurrent: usize) {
    let pending: Vec<usize> = drafts
        .iter()
        .enumerate()
        .filter(|(_, d)| {
            d.photo_url
                .as_deref()
                .is_some_and(|p| !p.starts_with("http://") && !p.starts_with("https://"))
        })
        .map(|(i, _)| i)
        .collect();
    if pending.is_empty() {
        return;
    }

    let storage = match ObjectStorage::new(config) {
        Ok(storage) => storage,
        Err(e) => {
            warn!("Dropping {} local photos: {}", pending.len(), e);
            for i in pending {
                drafts[i].photo_url = None;
            }
            return;
        }
    };

    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrent.max(1)));
    let tasks = pending.iter().map(|&i| {
        let permit = Arc::clone(&semaphore);
        let path = drafts[i].photo_url.clone().unwrap_or_default();
        let storage = &storage;
        async move {
            let _permit = permit.acquire().await.ok();
            (i, upload_photo(storage, Path::new(&path)).await)
        }
    });

    let results = join_all(tasks).await;
    for (i, result) in results {
        drafts[i].photo_url = match result {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("{}", e);
                None
            }
        };
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::try_parse()?;
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = Config::load();
    if let Some(url) = &args.api_url {
        config = config.with_api_url(url);
    }

    let backend = HttpBackend::new(&config)?;
    let store = SightingStore::new(backend.clone());
    let sessions = SessionStore::new(backend);

    match &args.command {
        Command::Signup { username, confirm } => {
            let request = SignupRequest {
                username: username.clone(),
                email: args.email.clone().unwrap_or_default(),
                password: args.password.clone().unwrap_or_default(),
                confirm_password: confirm.clone(),
            };
            let user = sessions.signup(&request).await?;
            println!("Welcome, {}! Your user id is {}", user.username, user.id);
        }
        Command::List { mine } => {
            store.load_all().await?;
            if *mine {
                let user = sign_in(&sessions, &args).await?;
                print_sightings(&store.sightings_by_account(&user.id, &user.username));
            } else {
                print_sightings(&store.snapshot());
            }
        }
        Command::Species => {
            store.load_all().await?;
            print_species(&store.snapshot());
        }
        Command::Photos => {
            store.load_all().await?;
            print_photos(&store.snapshot());
        }
        Command::Profile => {
            let user = sign_in(&sessions, &args).await?;
            store.load_all().await?;
            print_profile(&user, &store.sightings_by_account(&user.id, &user.username));
        }
        Command::Add(add) => {
            let user = sign_in(&sessions, &args).await?;
            let mut draft = build_draft(add, &user);
            if let Some(photo) = &add.photo {
                let storage = ObjectStorage::new(&config)?;
                draft.photo_url = Some(upload_photo(&storage, photo).await?);
            }
            let (sighting, outcome) = store.add(draft).await;
            println!(
                "Logged {} x{} as {}{}",
                sighting.animal_name,
                sighting.quantity,
                sighting.id,
                outcome_note(outcome)
            );
        }
        Command::Update(update) => {
            store.load_all().await?;
            let mut patch = build_patch(update);
            if let Some(photo) = &update.photo {
                let storage = ObjectStorage::new(&config)?;
                patch.photo_url = Some(Some(upload_photo(&storage, photo).await?));
            }
            match store.update(&SightingId::new(update.id.as_str()), &patch).await {
                Some((sighting, outcome)) => {
                    println!("Updated {}{}", sighting.id, outcome_note(outcome))
                }
                None => println!("No sighting {}", update.id),
            }
        }
        Command::Remove { id } => {
            store.load_all().await?;
            match store.remove(&SightingId::new(id.as_str())).await {
                Some(outcome) => println!("Removed {}{}", id, outcome_note(outcome)),
                None => println!("No sighting {}", id),
            }
        }
        Command::Export { output } => {
            store.load_all().await?;
            wildlife_tracker::save_to_csv(&store.snapshot(), output)?;
        }
        Command::Import { input, concurrent } => {
            let user = sign_in(&sessions, &args).await?;
            let mut drafts = wildlife_tracker::load_from_csv(input)?;
            for draft in drafts.iter_mut().filter(|d| d.user_id.is_none()) {
                draft.user_id = Some(user.id.clone());
                if draft.username.is_empty() {
                    draft.username = user.username.clone();
                }
            }
            upload_local_photos(&mut drafts, &config, *concurrent).await;

            let start = Instant::now();
            let progress_bar = ProgressBar::new(drafts.len() as u64);
            progress_bar.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {percent:>3}% {msg}")?
                    .progress_chars("##-"),
            );
            progress_bar.set_message("Importing sightings");

            let mut local_only = 0;
            for draft in drafts {
                if store.add(draft).await.1 == SyncOutcome::LocalOnly {
                    local_only += 1;
                }
                progress_bar.inc(1);
            }
            progress_bar.finish_and_clear();

            info!(
                "Imported {} sightings in {:.1}s ({} not saved on server)",
                store.len(),
                start.elapsed().as_secs_f64(),
                local_only
            );
        }
    }

    sessions.logout();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use wildlife_tracker::{Role, UserId};

    fn user() -> User {
        User {
            id: UserId::new("9"),
            username: "sam".to_string(),
            email: "sam@ufl.edu".to_string(),
            role: Role::Student,
            join_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            avatar_url: None,
        }
    }

    fn add_args() -> AddArgs {
        AddArgs {
            species: "Gator".to_string(),
            category: "reptile".to_string(),
            quantity: 0,
            lat: 29.64,
            lon: -82.35,
            address: "Lake Alice".to_string(),
            behavior: Some("Resting".to_string()),
            description: String::new(),
            date: Some("2025-02-03".to_string()),
            time: Some("14:30".to_string()),
            photo: None,
        }
    }

    #[test]
    fn test_build_draft() {
        let draft = build_draft(&add_args(), &user());

        assert!(draft.id.is_local());
        assert_eq!(draft.user_id, Some(UserId::new("9")));
        assert_eq!(draft.username, "sam");
        assert_eq!(draft.time, NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(draft.category, Category::Reptile);
        assert_eq!(draft.quantity, 1);
        assert_eq!(draft.behavior, Some(Behavior::Resting));
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2025, 2, 3));
        assert_eq!(draft.longitude, -82.35);
    }

    #[test]
    fn test_build_draft_defaults_to_now() {
        let args = AddArgs {
            date: None,
            time: None,
            ..add_args()
        };
        let draft = build_draft(&args, &user());
        assert!(draft.date.is_some());

        let time = draft.time.unwrap();
        assert_eq!(time.second(), 0);
        assert_eq!(time.nanosecond(), 0);
    }

    #[test]
    fn test_build_patch() {
        let args = UpdateArgs {
            id: "3".to_string(),
            species: None,
            category: Some("bird".to_string()),
            quantity: Some(2),
            behavior: Some(String::new()),
            description: None,
            photo: None::<PathBuf>,
            clear_photo: true,
        };
        let patch = build_patch(&args);

        assert_eq!(patch.category, Some(Category::Bird));
        assert_eq!(patch.quantity, Some(2));
        assert_eq!(patch.behavior, Some(None));
        assert_eq!(patch.photo_url, Some(None));
        assert_eq!(patch.animal_name, None);
    }

    #[test]
    fn test_build_patch_keeps_photo_by_default() {
        let args = UpdateArgs {
            id: "3".to_string(),
            species: None,
            category: None,
            quantity: None,
            behavior: None,
            description: None,
            photo: None,
            clear_photo: false,
        };
        assert!(build_patch(&args).is_empty());
    }
}
