use crate::config::Config;
use crate::generation::facade::Generator;
use crate::prompts::PromptStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Model-or-placeholder image generation.
    pub generator: Generator,
    /// Remote table → local file prompt lookup.
    pub prompts: PromptStore,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        Self {
            generator: Generator::from_config(&config),
            prompts: PromptStore::from_config(&config),
            config,
        }
    }
}
