use std::sync::Arc;

use retroslash_core::config::{AppConfig, ConfigError, LoadOptions};
use retroslash_postfacto::RetroClient;
use retroslash_slack::CommandDelegate;
use thiserror::Error;
use tracing::info;

use crate::webhook::WebhookState;

pub struct Application {
    pub config: AppConfig,
    pub webhook_state: WebhookState<RetroClient>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        channels = config.channels.len(),
        api_url = %config.postfacto.api_url,
        "starting application bootstrap"
    );

    let client = RetroClient::new(config.postfacto.api_url.clone());
    let delegate = CommandDelegate::new(config.channels.clone(), client);
    let webhook_state =
        WebhookState::new(config.slack.verification_token.clone(), Arc::new(delegate));

    Ok(Application { config, webhook_state })
}
