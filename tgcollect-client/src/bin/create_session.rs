use std::io::{self, BufRead, Write};
use tgcollect_client::client::{TelegramClient, TelegramConfig, TelegramError};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error(transparent)]
    Telegram(#[from] TelegramError),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tgcollect_client=info,create_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_config() -> Result<TelegramConfig, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

fn prompt(message: &str) -> io::Result<String> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(message.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let config = get_config()?;

    let client = TelegramClient::connect(&config).await?;

    if client.is_authorized().await? {
        info!("Session is already authorized, nothing to do");
    } else {
        let user_id = client.log_in(&config.phone_number, prompt).await?;
        info!(user_id, session_file = %config.session_file().display(), "Session file created");
    }

    client.disconnect()?;
    Ok(())
}
