//! BucketKV - HTTP Server
//! Opens the store, puts the access gate in front of it and serves until
//! interrupted.

use std::process::ExitCode;
use std::sync::Arc;

use bucketkv::auth::AccessGate;
use bucketkv::config::Config;
use bucketkv::error::Result;
use bucketkv::server;
use bucketkv::store::Store;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("[ERROR] {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;
    let gate = Arc::new(AccessGate::new(&config.secret)?);
    let store = Arc::new(Store::open(&config)?);

    let served = serve(&config, Arc::clone(&store), gate).await;

    store.close();
    log::info!("{}", store.metrics().report());
    served
}

async fn serve(config: &Config, store: Arc<Store>, gate: Arc<AccessGate>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    log::info!("BucketKV listening on {}", config.listen_addr());

    axum::serve(listener, server::router(store, gate))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Shutting down BucketKV...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                log::warn!("Failed to listen for SIGTERM: {}", err);
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
