use anyhow::{Result, bail};
use std::sync::Arc;

use agri_advisor::config::Config;
use agri_advisor::redis::RedisManager;
use agri_advisor::repository::RedisIdentityResolver;

/// Register a bearer token for a user id.
///
/// Usage: issue_token <uid> [token]
/// A random token is generated when none is given; it is printed once and
/// only its digest is stored.
#[tokio::main]
async fn main() -> Result<()> {
    // Minimal stderr tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(uid) = args.next().filter(|u| !u.trim().is_empty()) else {
        bail!("usage: issue_token <uid> [token]");
    };
    if uid.contains('/') {
        bail!("uid must not contain '/'");
    }
    let token = args
        .next()
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

    let config = Arc::new(Config::load());
    let redis = Arc::new(RedisManager::new_with_config(&config).await?);
    let resolver = RedisIdentityResolver::new(redis);
    resolver.register_token(&token, &uid).await?;

    tracing::info!("Registered token for uid {}", uid);
    println!("{token}");
    Ok(())
}
