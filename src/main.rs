mod cli;

use clap::Parser;
use cli::Cli;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tubetap::broker::BeanstalkDialer;
use tubetap::config::Config;
use tubetap::observability::{self, LogOutput, TracingLog};
use tubetap::watcher::{BrokerEndpoint, QueueWatcher};

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.clone())?;
    let config = cli.apply(config);
    // Flags bypass the load-time validation pass, so check again.
    config.validate()?;

    let output = LogOutput::parse(&config.log.output);
    let _guard = observability::init(&config.log.level, &output)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.log.level,
        output = %output,
        "starting tubetap"
    );

    let endpoint = BrokerEndpoint {
        host: config.broker.host.clone(),
        port: config.broker.port,
    };
    let interval = config.watch.poll_interval()?;

    let mut watcher = QueueWatcher::new(
        endpoint,
        interval,
        config.watch.tubes.clone(),
        BeanstalkDialer,
        Arc::new(TracingLog),
    )?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    watcher.run(shutdown_rx).await?;

    Ok(())
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
