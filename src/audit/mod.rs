mod log;
mod page;

use axum::{routing::get, Router};

use crate::AppState;

pub use log::{get_one, list_for_event, record, EventLog, LogView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/logs", get(page::logs))
        .route("/events/{event_id}/logs/{log_id}", get(page::log))
}
