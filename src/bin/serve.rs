use std::fmt::Debug;
use std::net::TcpListener;

use listenfd::ListenFd;
use manage_me::services::configurators::Env;
use manage_me::services::storage::user::{InMemory, Mongo};
use manage_me::{routes, Configurator, UserStorage};
use tracing::{error, info};

fn setup_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let config = tracing_subscriber::registry().with(filter_layer);

    if atty::is(atty::Stream::Stdout) {
        config.with(fmt::layer().pretty()).try_init()?;
    } else {
        config.with(fmt::layer().json()).try_init()?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(?error, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                error!(?error, "could not listen for SIGTERM");
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

    info!("shutdown signal received");
}

async fn serve<S>(bind: TcpListener, storage: S) -> anyhow::Result<()>
where
    S: UserStorage + Clone + Debug + 'static,
{
    let app = routes(storage.clone());

    axum::Server::from_tcp(bind)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped, closing user storage");
    storage.close().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing()?;

    let config = Env::from_env()?;
    let mut listenfd = ListenFd::from_env();

    let bind = if let Some(listener) = listenfd.take_tcp_listener(0)? {
        listener
    } else {
        TcpListener::bind(config.bind_address())?
    };

    info!(
        environment = config.environment(),
        address = %bind.local_addr()?,
        "server listening"
    );

    if let Some(uri) = config.mongodb_uri() {
        let storage = Mongo::connect(uri, config.mongodb_database()).await?;
        serve(bind, storage).await
    } else {
        info!("MONGODB_URI not set, keeping users in memory");
        serve(bind, InMemory::default()).await
    }
}
