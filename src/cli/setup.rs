//! Shared command setup: configuration, logging, client.

use crate::cli::ConnectionArgs;
use crate::client::RagClient;
use crate::config::RagChatConfig;
use crate::logging::init_tracing;

/// Everything a backend-facing command needs.
pub struct Context {
    pub config: RagChatConfig,
    pub client: RagClient,
}

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ConnectionArgs,
) -> Result<RagChatConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        RagChatConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        RagChatConfig::default()
    };

    config = config.with_env_overrides();

    // CLI overrides (highest priority)
    if let Some(ref url) = args.url {
        config.backend.url = url.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration, initialize logging and build the client.
pub fn prepare(args: &ConnectionArgs) -> Result<Context, Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(args)?;
    init_tracing(&config.logging)?;

    let client = RagClient::new(&config.backend)?;
    tracing::debug!(url = %client.base_url(), "client ready");

    Ok(Context { config, client })
}
