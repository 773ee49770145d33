mod active;
mod events;
mod new;
mod page;
mod registry;

use axum::{routing, Router};

use crate::AppState;

pub use active::{get_active_profiles, set_active_profiles, ActiveProfiles};
pub use registry::{
    create, ensure_all_exist, existing, find, get, list, set_timezone, summaries, update, Profile,
    ProfileChanges, ProfileSummary,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles", routing::get(page::profiles).post(new::new_profile))
        .route("/profiles/{profile_id}", routing::get(page::profile).put(page::update_profile))
        .route("/profiles/{profile_id}/events", routing::get(events::profile_events))
}
