use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wildlife")]
#[command(about = "Log and review wildlife sightings")]
#[command(version)]
pub(crate) struct Args {
    /// Backend API base URL, overrides WILDLIFE_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Account email, needed by commands that act as a user
    #[arg(short, long, global = true)]
    pub email: Option<String>,

    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List sightings in collection order
    List {
        /// Only show the signed-in user's sightings
        #[arg(long)]
        mine: bool,
    },
    /// Species totals per category
    Species,
    /// Cover photo per category
    Photos,
    /// Profile and statistics of the signed-in user
    Profile,
    /// Log a new sighting
    Add(AddArgs),
    /// Edit fields of an existing sighting
    Update(UpdateArgs),
    /// Delete a sighting
    Remove { id: String },
    /// Write all sightings to a CSV file
    Export {
        #[arg(short, long, default_value = "sightings.csv")]
        output: PathBuf,
    },
    /// Add every row of a CSV file as a new sighting
    Import {
        input: PathBuf,

        /// Maximum number of concurrent photo uploads
        #[arg(short, long, default_value = "4")]
        concurrent: usize,
    },
    /// Create an account
    Signup {
        #[arg(short, long)]
        username: String,

        #[arg(long)]
        confirm: String,
    },
}

#[derive(ClapArgs)]
pub(crate) struct AddArgs {
    /// Species name
    #[arg(short, long)]
    pub species: String,

    #[arg(short, long, default_value = "Other")]
    pub category: String,

    #[arg(short, long, default_value = "1")]
    pub quantity: u32,

    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    #[arg(short, long, default_value = "")]
    pub address: String,

    #[arg(short, long)]
    pub behavior: Option<String>,

    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Observation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<String>,

    /// Observation time (HH:MM), defaults to now
    #[arg(long)]
    pub time: Option<String>,

    /// Image file to upload with the sighting
    #[arg(long)]
    pub photo: Option<PathBuf>,
}

#[derive(ClapArgs)]
pub(crate) struct UpdateArgs {
    pub id: String,

    #[arg(short, long)]
    pub species: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,

    #[arg(short, long)]
    pub quantity: Option<u32>,

    /// New behavior; an empty value clears it
    #[arg(short, long)]
    pub behavior: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub photo: Option<PathBuf>,

    /// Remove the sighting's photo
    #[arg(long, conflicts_with = "photo")]
    pub clear_photo: bool,
}
