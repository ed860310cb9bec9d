use anyhow::Context;
use scout::{
    api::routes::app,
    cli::{output::Output, Cli, Commands},
    types::ModelKind,
    AppState, ConfigManager, DatabaseProvider, ScoutConfig,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = Output::from_flag(cli.no_color);

    let config_manager = match ConfigManager::new(&cli.config) {
        Ok(manager) => Arc::new(manager),
        Err(e) => {
            output.error(&format!("Failed to load {}: {}", cli.config.display(), e));
            output.hint("Copy scout.toml and .env.example, then set the provider API keys");
            std::process::exit(1);
        }
    };
    let config = config_manager.config();

    match cli.command() {
        Commands::Config { validate } => {
            show_config(&output, &config, config_manager.path(), validate);
            Ok(())
        }
        Commands::Migrate => {
            init_tracing(&config, cli.verbose)?;
            migrate(&output, &config).await
        }
        Commands::Serve => {
            init_tracing(&config, cli.verbose)?;
            output.banner();
            serve(&output, config_manager).await
        }
    }
}

fn init_tracing(config: &ScoutConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.server.log_format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

fn show_config(output: &Output, config: &ScoutConfig, path: &std::path::Path, validate: bool) {
    if validate {
        // Loading already validated the file
        output.success(&format!("{} is valid", path.display()));
        return;
    }

    output.header("Server");
    output.kv("address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log level", &config.server.log_level);
    output.kv("log format", &config.server.log_format);

    output.header("Database");
    output.kv("url", &config.database.url);

    output.header("Providers");
    for kind in ModelKind::ALL {
        match config.providers.get(kind) {
            Some(provider) => {
                let model = provider.model.as_deref().unwrap_or("default model");
                output.list_item(&format!(
                    "{} ({}, key from ${})",
                    kind, model, provider.api_key_env
                ));
            }
            None => output.warning(&format!("{kind} is not configured; its queries are rejected")),
        }
    }

    output.header("Research");
    output.kv(
        "general information",
        &config.research.general_information.to_string(),
    );
    output.kv(
        "search enrichment",
        &config.research.search_enrichment.to_string(),
    );
    output.kv("embeddings", &config.research.embeddings.enabled.to_string());
}

async fn migrate(output: &Output, config: &ScoutConfig) -> anyhow::Result<()> {
    output.info(&format!("Running migrations on {}", config.database.url));
    let store = DatabaseProvider::from_config(&config.database)
        .create_client()
        .await
        .context("failed to open the database")?;

    let report = store.run_migrations().await?;
    if report.success {
        output.success(&report.message);
    } else {
        output.error(&report.message);
    }
    Ok(())
}

async fn serve(output: &Output, config_manager: Arc<ConfigManager>) -> anyhow::Result<()> {
    let config = config_manager.config();
    let state = AppState::build(config_manager)
        .await
        .context("failed to initialize application state")?;
    let background = state.clone();

    tracing::info!(
        providers = ?state.providers.configured(),
        database = %config.database.url,
        "Research server configured"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);
    output.info(&format!("Listening on http://{addr} (Ctrl-C to stop)"));

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(
        jobs = background.scheduler.in_flight(),
        streams = background.gateway.in_flight(),
        "Waiting for research work to finish"
    );
    background.wait_idle().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
