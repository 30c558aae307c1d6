use serde::Deserialize;
use server::ServerState;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tgcollect_client::client::{TelegramClient, TelegramConfig, TelegramError};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error(transparent)]
    Telegram(#[from] TelegramError),
    #[error("User is not authorized. Please run create-session again.")]
    Unauthorized,
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tgcollect_api=debug,\
                tgcollect_common=debug,\
                tgcollect_client=debug,\
                tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<(Env, TelegramConfig), InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    Ok((envy::from_env()?, envy::from_env()?))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "Could not listen for shutdown signal");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let (env, telegram_config) = get_env()?;

    info!("Connecting to Telegram");
    let client = Arc::new(TelegramClient::connect(&telegram_config).await?);
    if !client.is_authorized().await? {
        return Err(InitError::Unauthorized);
    }
    info!("Telegram client connected and authorized");

    let state = ServerState {
        client: client.clone(),
    };
    let app = server::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe);

    shutdown(served, client.disconnect())
}

/// A serve failure outranks a failure to persist the session, which is then only logged.
fn shutdown(
    served: Result<(), InitError>,
    disconnected: Result<(), TelegramError>,
) -> Result<(), InitError> {
    match (served, disconnected) {
        (Err(serve_err), Err(disconnect_err)) => {
            error!(%disconnect_err, "Could not disconnect from Telegram");
            Err(serve_err)
        }
        (served, Ok(())) => served,
        (Ok(()), Err(disconnect_err)) => Err(disconnect_err.into()),
    }
}
