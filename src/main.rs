use chat_core::core::AppState;
use chat_core::{Config, db, services};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let pool = db::connect(&config).await?;
    let state = AppState::new(pool, &config);

    // Bootstrap identity for the default group; real callers come from the
    // identity service.
    let admin_id = env::var("BOOTSTRAP_ADMIN_ID")
        .ok()
        .and_then(|raw| Uuid::parse_str(&raw).ok())
        .unwrap_or_else(Uuid::new_v4);
    let admin_username =
        env::var("BOOTSTRAP_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());

    let default_group = services::ensure_default_group(&state, admin_id, &admin_username).await?;
    info!(group_id = %default_group.id, name = %default_group.name, "Core ready");

    Ok(())
}
