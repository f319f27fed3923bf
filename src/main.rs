use anyhow::Context;
use clap::Parser;
use groupscan::adapters::{build_http_client, Identity, MediaWikiClient, MediaWikiFactory};
use groupscan::cli::Cli;
use groupscan::config::{AppConfig, LoggingConfig};
use groupscan::fleet::FleetDirectory;
use groupscan::persistence::{ArtifactWriter, JsonFileWriter};
use groupscan::services::{write_diagnostics, SurveyRunner};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config_dir)
        .with_context(|| format!("failed to load configuration from {}", cli.config_dir))?;
    cli.apply(&mut config);

    init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Invalid configuration: {}", e);
        }
        anyhow::bail!("invalid configuration ({} errors)", errors.len());
    }

    let baseline = config.baseline.build()?;
    let identity = Identity {
        user_agent: config.hub.user_agent.clone(),
        username: config.hub.username.clone(),
        password: config.hub.password.clone(),
    };
    // The timeout applies to probes only; the shared client never times out.
    let http = build_http_client(&identity, None)?;

    let hub = MediaWikiClient::new(http.clone(), &config.hub.api_url)?;
    if let Some((username, password)) = identity.credentials() {
        hub.login(username, password)
            .await
            .context("login to the hub wiki failed")?;
    } else {
        info!("No credentials configured, querying anonymously");
    }

    let directory = FleetDirectory::new(Arc::new(hub), Arc::new(MediaWikiFactory::new(http)));
    let runner = SurveyRunner::new(directory, baseline, config.survey.throttle_options());

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, cancelling survey");
        let _ = cancel_tx.send(true);
    });

    let file_writer = JsonFileWriter::new(&config.output.path);
    let writer: Option<&dyn ArtifactWriter> = if cli.dry_run {
        None
    } else {
        Some(&file_writer)
    };

    let report = runner
        .run_and_persist(writer, cancel_rx)
        .await
        .context("survey failed")?;

    let stdout = std::io::stdout();
    write_diagnostics(&report, &mut stdout.lock())?;
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},hyper=warn,reqwest=warn", logging.level))
    });

    // stdout is reserved for the diagnostics lines.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
