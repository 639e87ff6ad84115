//! Application assembly: configuration, stores, registry, dispatcher.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use capstan_agent::IntentRouter;
use capstan_core::audit::AuditLog;
use capstan_core::capability::CapabilityRegistry;
use capstan_core::config::{
    AppConfig, ConfigError, EmbeddingProviderKind, Environment, LoadOptions,
};
use capstan_core::dispatch::Dispatcher;
use capstan_core::domain::{ProductStore, TicketStore};
use capstan_retrieval::{Embedder, EmbeddingError, OpenAiEmbeddings, RetrievalScorer};

use crate::seed;
use crate::tools;

/// Shared per-request state. Cheap to clone: everything inside is a handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<CapabilityRegistry>,
    pub dispatcher: Dispatcher,
    pub audit: AuditLog,
    pub router: Arc<IntentRouter>,
    pub tickets: TicketStore,
}

impl AppState {
    /// Whether internal error details may reach callers.
    pub fn expose_internal_errors(&self) -> bool {
        self.config.server.environment == Environment::Development
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("embedding provider initialization failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<AppState, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<AppState, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let embedder = match config.embedding.provider {
        EmbeddingProviderKind::Hashing => Embedder::hashing(config.embedding.dimension),
        EmbeddingProviderKind::OpenAi => match config.embedding.api_key.as_ref() {
            Some(api_key) => {
                let provider = OpenAiEmbeddings::new(api_key, config.embedding.model.clone())?;
                Embedder::with_provider(Arc::new(provider), config.embedding.dimension)
            }
            // Config validation rejects this combination; degrade to the
            // deterministic fallback rather than failing startup.
            None => Embedder::hashing(config.embedding.dimension),
        },
    };
    let scorer = RetrievalScorer::new(embedder.clone());

    let products = ProductStore::seeded();
    let tickets = seed::seed_tickets();
    let chunks = seed::seed_chunks(&embedder).await;
    info!(
        event_name = "system.bootstrap.seeded",
        products = products.len(),
        chunks = chunks.len(),
        "seed data loaded"
    );

    let mut registry = CapabilityRegistry::new();
    tools::register_builtin(&mut registry, products, tickets.clone(), chunks, scorer);
    let registry = Arc::new(registry);
    info!(
        event_name = "system.bootstrap.registry_ready",
        capabilities = registry.len(),
        "capability registry initialized"
    );

    let audit = AuditLog::new(config.audit.capacity);
    let dispatcher = Dispatcher::new(registry.clone(), audit.clone());

    Ok(AppState {
        config: Arc::new(config),
        registry,
        dispatcher,
        audit,
        router: Arc::new(IntentRouter::new()),
        tickets,
    })
}
