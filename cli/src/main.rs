//! CLI entrypoint for vibecation
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use vibecation_application::{
    AuditLog, CandidateGenerator, CastVoteUseCase, ChatHub, ChatService, CompletePhaseUseCase,
    DecisionFinalizer, LocalSubscriberRegistry, NoAuditLog, OptionDerivation, PollUseCase,
    SuggestionUseCase, TripUseCase,
};
use vibecation_domain::Phase;
use vibecation_infrastructure::{
    ConfigLoader, FileConfig, FileGeneratorConfig, InMemoryStore, InProcessBroker, JsonlAuditLog,
    SampleItineraryGenerator,
};
use vibecation_presentation::{AppState, Cli, Command, ConsoleFormatter, router};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, config.server.log_dir.as_deref());

    let issues = config.validate();
    for issue in &issues {
        eprintln!("{}", ConsoleFormatter::issue(issue.is_error(), &issue.message));
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Configuration has errors");
    }

    match cli.command {
        Command::ShowConfig => show_config(cli.config.as_ref(), &config),
        Command::Serve { bind } => serve(config, bind).await,
    }
}

/// Console logging filtered by `-v`, plus daily files when `log_dir` is set.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "vibecation.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(EnvFilter::new(level)),
        )
        .with(file_layer)
        .init();

    guard
}

fn show_config(explicit: Option<&std::path::PathBuf>, config: &FileConfig) -> Result<()> {
    print!(
        "{}",
        ConsoleFormatter::config_sources(&ConfigLoader::config_sources(explicit))
    );
    print!("{}", ConsoleFormatter::session_params(&config.to_session_params()));
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    print!("{}", ConsoleFormatter::effective_config(&rendered));
    Ok(())
}

async fn serve(config: FileConfig, bind: Option<String>) -> Result<()> {
    let params = config.to_session_params();
    let addr: SocketAddr = match bind {
        Some(bind) => bind
            .parse()
            .with_context(|| format!("Invalid --bind address '{}'", bind))?,
        None => config.server.bind_addr()?,
    };

    // === Dependency Injection ===
    let audit: Arc<dyn AuditLog> = match &config.server.audit_log {
        Some(path) => match JsonlAuditLog::open(path) {
            Some(log) => {
                info!("Audit log: {}", log.path().display());
                Arc::new(log)
            }
            None => Arc::new(NoAuditLog),
        },
        None => Arc::new(NoAuditLog),
    };

    let store = Arc::new(InMemoryStore::new());
    let broker = Arc::new(InProcessBroker::new(config.chat.broker_capacity()));
    let registry = Arc::new(LocalSubscriberRegistry::new());
    let cancellation = CancellationToken::new();
    let hub = ChatHub::spawn(broker.as_ref(), registry.clone(), cancellation.child_token());

    let chat = Arc::new(
        ChatService::new(store.clone(), store.clone(), broker, registry)
            .with_params(params.chat)
            .with_audit(audit.clone()),
    );
    let polls = Arc::new(PollUseCase::new(store.clone(), store.clone(), store.clone()));
    let decisions = Arc::new(
        DecisionFinalizer::new(store.clone(), polls.clone(), store.clone())
            .with_policy(params.decision)
            .with_audit(audit.clone()),
    );
    let phases = CompletePhaseUseCase::new(store.clone(), store.clone())
        .with_action(
            Phase::Brainstorm,
            Arc::new(OptionDerivation::new(store.clone(), store.clone())),
        )
        .with_action(Phase::Polling, decisions.clone())
        .with_notifier(chat.clone())
        .with_audit(audit.clone())
        .with_params(&params);
    let votes = CastVoteUseCase::new(store.clone(), store.clone(), store.clone(), store.clone())
        .with_audit(audit.clone())
        .with_params(&params);
    let suggestions = SuggestionUseCase::new(
        store.clone(),
        store.clone(),
        store.clone(),
        build_generator(&config.generator)?,
    )
    .with_audit(audit.clone())
    .with_params(&params);
    let trips = TripUseCase::new(store).with_audit(audit);

    let state = AppState {
        trips: Arc::new(trips),
        votes: Arc::new(votes),
        polls,
        phases: Arc::new(phases),
        decisions,
        suggestions: Arc::new(suggestions),
        chat,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    println!("{}", ConsoleFormatter::server_banner(&addr, &params));
    info!("Listening on {}", addr);

    let shutdown = cancellation.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    hub.shutdown().await;
    Ok(())
}

fn build_generator(config: &FileGeneratorConfig) -> Result<Arc<dyn CandidateGenerator>> {
    #[cfg(feature = "remote-generator")]
    if let Some(endpoint) = &config.endpoint {
        let generator = vibecation_infrastructure::HttpCandidateGenerator::new(
            endpoint,
            std::time::Duration::from_secs(config.timeout_secs),
        )?;
        info!("Using remote candidate generator at {}", endpoint);
        return Ok(Arc::new(generator));
    }

    if let Some(endpoint) = &config.endpoint {
        warn!(
            "generator.endpoint {} ignored: built without remote-generator",
            endpoint
        );
    }
    Ok(Arc::new(SampleItineraryGenerator::new()))
}
