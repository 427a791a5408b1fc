//! Server state shared by every handler.

use std::sync::Arc;

use crate::{
    domain::SubscriptionRepository, infrastructure::repository::InMemorySubscriptionRepository,
};

/// Shared application state
pub struct AppState {
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn SubscriptionRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    /// State backed by the in-memory repository
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySubscriptionRepository::new()))
    }
}
