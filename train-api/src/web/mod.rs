//! Web layer: a versioned JSON API over the published timetable.

mod auth;
mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, api_base_path, create_router};
pub use state::AppState;
