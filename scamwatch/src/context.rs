use std::sync::Arc;

use crate::auth::Authenticator;
use crate::enrich::EnrichStage;
use crate::urlscan::Scanner;

pub const DEFAULT_DATA_PATH: &str = "_data/scams.yaml";

/// Process-wide collaborators, built once at startup and shared read-only by
/// every workflow instance.
pub struct BotContext {
    pub auth: Arc<dyn Authenticator>,
    pub enrich: EnrichStage,
    pub data_path: String,
}

impl BotContext {
    pub fn new(auth: Arc<dyn Authenticator>, scanner: Arc<dyn Scanner>) -> Self {
        Self {
            auth,
            enrich: EnrichStage::new(scanner),
            data_path: DEFAULT_DATA_PATH.to_string(),
        }
    }

    pub fn with_data_path(mut self, path: impl Into<String>) -> Self {
        self.data_path = path.into();
        self
    }
}
