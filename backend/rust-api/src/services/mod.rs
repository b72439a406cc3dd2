use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::services::chat_registry::ChatSessionRegistry;
use crate::services::failure::{FailureClassifier, GeminiFailureClassifier};
use crate::services::gemini::{AiGateway, GeminiGateway};
use crate::services::repository::{MemoryRepository, MongoRepository, Repository};

pub struct AppState {
    pub config: Config,
    pub repository: Arc<dyn Repository>,
    pub gateway: Arc<dyn AiGateway>,
    pub classifier: Arc<dyn FailureClassifier>,
    pub chats: ChatSessionRegistry,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let repository: Arc<dyn Repository> = match config.storage_backend {
            StorageBackend::Mongo => {
                tracing::info!("Connecting to MongoDB database {}", config.mongo_database);
                let repository =
                    MongoRepository::connect(&config.mongo_uri, &config.mongo_database).await?;
                repository.ping().await?;
                tracing::info!("MongoDB connected");
                Arc::new(repository)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Arc::new(MemoryRepository::new())
            }
        };

        let gateway = Arc::new(GeminiGateway::new(&config.gemini)?);
        tracing::info!(
            "Gemini gateway ready (model {}, configured: {})",
            config.gemini.model,
            gateway.is_configured()
        );

        Ok(Self::with_components(config, repository, gateway))
    }

    /// Assembles state from ready-made parts.
    pub fn with_components(
        config: Config,
        repository: Arc<dyn Repository>,
        gateway: Arc<dyn AiGateway>,
    ) -> Self {
        let chats = ChatSessionRegistry::new(&config.chat);
        Self {
            config,
            repository,
            gateway,
            classifier: Arc::new(GeminiFailureClassifier),
            chats,
        }
    }
}

pub mod chat_registry;
pub mod content_classifier;
pub mod failure;
pub mod gemini;
pub mod mock_fallback;
pub mod practice_service;
pub mod repository;
pub mod session_service;
pub mod staging;
pub mod tutor_service;
pub mod upload_service;
