//! Application state for the web layer.

use std::sync::Arc;

use crate::domain::TimeTable;
use crate::refresh::Refresher;

use super::routes::AppError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Refresh orchestrator, owning the published timetable
    pub refresher: Arc<Refresher>,

    /// Token clients must present
    pub authorization_token: Arc<str>,
}

impl AppState {
    pub fn new(refresher: Arc<Refresher>, authorization_token: &str) -> Self {
        Self {
            refresher,
            authorization_token: Arc::from(authorization_token),
        }
    }

    /// The published timetable, held for the rest of the request.
    pub async fn timetable(&self) -> Result<Arc<TimeTable>, AppError> {
        self.refresher
            .published()
            .current()
            .await
            .ok_or(AppError::NotReady)
    }
}
