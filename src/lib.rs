pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::services::{
    generation_service::{GenerationService, GenerationSettings},
    mode_service::{ConnectivityProbe, ProviderProbe},
    provider_service,
    usage_service::UsageService,
};
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub generation_service: GenerationService,
    pub usage_service: UsageService,
    pub mode_arbiter: Arc<dyn ConnectivityProbe>,
}

impl AppState {
    pub fn new() -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let providers = provider_service::build_providers(config, http_client.clone());
        let mode_arbiter: Arc<dyn ConnectivityProbe> =
            Arc::new(ProviderProbe::new(providers.len(), config.force_offline));
        let generation_service =
            GenerationService::new(providers, GenerationSettings::from_config(config));
        let usage_service = UsageService::new(http_client, config.usage_webhook_url.clone());

        Self {
            generation_service,
            usage_service,
            mode_arbiter,
        }
    }

    /// Same wiring with a caller-supplied probe; used by tests to pin the
    /// arbiter decision.
    pub fn with_probe(probe: Arc<dyn ConnectivityProbe>) -> Self {
        let mut state = Self::new();
        state.mode_arbiter = probe;
        state
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
