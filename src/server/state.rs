use axum::extract::FromRef;

use crate::catalog_store::CatalogStore;
use crate::detection::EmotionDetector;
use crate::emotion_log::EmotionLogStore;
use crate::media_store::MediaStore;
use crate::user::UserStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type GuardedEmotionLogStore = Arc<dyn EmotionLogStore>;
pub type GuardedUserStore = Arc<dyn UserStore>;
pub type GuardedDetector = Arc<EmotionDetector>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_store: GuardedCatalogStore,
    pub media_store: MediaStore,
    pub emotion_log_store: GuardedEmotionLogStore,
    pub user_store: GuardedUserStore,
    pub detector: GuardedDetector,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for MediaStore {
    fn from_ref(input: &ServerState) -> Self {
        input.media_store.clone()
    }
}

impl FromRef<ServerState> for GuardedEmotionLogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.emotion_log_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserStore {
    fn from_ref(input: &ServerState) -> Self {
        input.user_store.clone()
    }
}

impl FromRef<ServerState> for GuardedDetector {
    fn from_ref(input: &ServerState) -> Self {
        input.detector.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
