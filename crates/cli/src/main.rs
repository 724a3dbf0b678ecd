use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    clap::Parser,
    secrecy::ExposeSecret,
    tokio_util::sync::CancellationToken,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    mantle_assistant::http::HttpBackend,
    mantle_channels::ChannelOutbound,
    mantle_chat::ChatEngine,
    mantle_discord::{DiscordOutbound, gateway},
    mantle_sessions::SessionRegistry,
};

#[derive(Parser)]
#[command(name = "mantle", about = "Mantle — Discord assistant relay")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides the standard search locations).
    #[arg(long, env = "MANTLE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    dotenvy::dotenv().ok();
    let mut config = match &cli.config {
        Some(path) => mantle_config::load_config(path)?,
        None => mantle_config::discover_and_load(),
    };
    mantle_config::apply_env_overrides(&mut config);
    let resolved = config.resolve()?;

    let cancel = CancellationToken::new();
    let backend = Arc::new(HttpBackend::new(
        resolved.base_url.clone(),
        resolved.api_key.clone(),
    ));
    let outbound = Arc::new(DiscordOutbound::new());
    let registry = SessionRegistry::new(Duration::from_secs(resolved.idle_hours * 3600));
    let engine = Arc::new(ChatEngine::new(
        registry,
        backend,
        Arc::clone(&outbound) as Arc<dyn ChannelOutbound>,
        resolved.assistant_id.clone(),
        resolved.message_limit,
        cancel.clone(),
    ));

    info!(
        assistant_id = %resolved.assistant_id,
        idle_hours = resolved.idle_hours,
        "starting mantle"
    );

    let mut gateway_task = tokio::spawn(gateway::run(
        resolved.discord_token.expose_secret().clone(),
        engine,
        outbound,
        cancel.clone(),
    ));

    tokio::select! {
        result = &mut gateway_task => {
            result??;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            cancel.cancel();
            gateway_task.await??;
        },
    }

    info!("bot shut down cleanly");
    Ok(())
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
