use std::sync::Arc;

use provost_core::queue::JobQueue;
use provost_core::store::CourseStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CourseStore>,
    pub queue: Arc<JobQueue>,
}

impl AppState {
    pub fn new(store: Arc<CourseStore>, queue: Arc<JobQueue>) -> Self {
        Self { store, queue }
    }
}
