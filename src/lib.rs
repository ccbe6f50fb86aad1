//! Client for a citizen-science wildlife sighting service.
//!
//! [`SightingStore`] keeps the sighting collection in memory and in step with the
//! backend, [`views`] derives the gallery and profile projections from it, and
//! [`SessionStore`] tracks who is signed in.

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod record;
pub mod session;
pub mod store;
pub mod upload;
pub mod views;

#[cfg(test)]
mod fake;

pub use api::{AuthApi, AuthResponse, AuthUser, HttpBackend, SightingApi, SignupRequest};
pub use config::Config;
pub use error::ApiError;
pub use export::{load_from_csv, save_to_csv};
pub use record::{Behavior, Category, Sighting, SightingId, SightingPatch, UserId};
pub use session::{Role, Session, SessionStore, User, UserPatch};
pub use store::{SightingStore, Snapshot, SyncOutcome};
pub use upload::{ObjectStorage, PhotoStorage, upload_photo};
pub use views::{CategorySummary, SpeciesCount, UserStats};
