mod assign;
mod crud;
mod model;
mod store;

use axum::{routing, Router};

use crate::AppState;

pub use model::{Event, EventChanges, NewEvent};
pub use store::{
    assign_profiles, create, delete as delete_event, get, list, list_for_profiles, patch, replace,
    unassign_profile, Replaced,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", routing::get(crud::events).post(crud::new_event))
        .route(
            "/events/{event_id}",
            routing::get(crud::event)
                .put(crud::replace_event)
                .patch(crud::patch_event)
                .delete(crud::delete_event),
        )
        .route("/events/{event_id}/assign", routing::post(assign::assign))
        .route("/events/{event_id}/unassign/{profile_id}", routing::delete(assign::unassign))
}
