pub mod agent;
pub mod api;
pub mod api_response;
pub mod config;
pub mod error;
mod http_client;
pub mod llm;
pub mod memory;
pub mod models;
pub mod services;
pub mod storage;
pub mod tools;

pub use models::*;

use std::sync::Arc;
use std::time::Duration;

use agent::ChatAgent;
use config::Settings;
use llm::LlmClient;
use memory::{CompactionConfig, HistoryCompactor};
use storage::{ContextStore, InMemoryCache, RedbRepository};
use tools::WebSearchTool;

/// Core application state shared by all request handlers.
pub struct AppCore {
    pub settings: Settings,
    pub store: ContextStore,
    pub agent: ChatAgent,
    pub compactor: HistoryCompactor,
    /// The summarizer is the same client the agent replies with.
    pub llm: Arc<dyn LlmClient>,
}

impl AppCore {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let llm = llm::factory::create_client(&settings)?;
        Self::with_client(settings, llm)
    }

    /// Build the core around an already-constructed LLM client.
    pub fn with_client(settings: Settings, llm: Arc<dyn LlmClient>) -> anyhow::Result<Self> {
        let cache = Arc::new(InMemoryCache::new());
        let repository = Arc::new(RedbRepository::new(&settings.db_path)?);
        let store = ContextStore::new(
            cache,
            repository,
            Duration::from_secs(settings.cache_ttl_seconds),
        );

        let mut search = WebSearchTool::new();
        if let Some(key) = &settings.brave_api_key {
            search = search.with_brave_key(key);
        }
        let agent = ChatAgent::new(llm.clone()).with_tool(Arc::new(search));

        let compactor = HistoryCompactor::new(CompactionConfig::from_settings(&settings));

        Ok(Self {
            settings,
            store,
            agent,
            compactor,
            llm,
        })
    }
}
