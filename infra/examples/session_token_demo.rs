//! Session token lifecycle walkthrough
//!
//! Runs against the in-process store and cache by default. Set `ST_DEMO_CONFIG`
//! to the path of a TOML configuration to run against MySQL and Redis instead.
//!
//! ```bash
//! cargo run -p st_infra --example session_token_demo
//! ```

use anyhow::Result;
use st_core::repositories::InMemoryTokenStore;
use st_core::{RefreshOutcome, TokenLifecycleService, TokenStore};
use st_infra::cache::MemoryRecordCache;
use st_infra::store::CachedTokenStore;
use st_shared::config::{AppConfig, LoggingConfig, TokenConfig};
use st_shared::{init_tracing, mask_token};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&LoggingConfig::default())?;

    match std::env::var("ST_DEMO_CONFIG") {
        Ok(path) => {
            let config = AppConfig::from_toml_str(&std::fs::read_to_string(path)?)?;
            let services = st_infra::initialize(&config).await?;
            println!("healthy: {}", services.health_check().await?);
            walkthrough(&services.tokens).await?;
            services.shutdown().await;
        }
        Err(_) => {
            let token_config = TokenConfig::new("demo-public-key", "demo-secret-key", 3600, 7 * 86400);
            let store = CachedTokenStore::new(InMemoryTokenStore::new(), MemoryRecordCache::new());
            let service = TokenLifecycleService::new(store, &token_config)?;
            walkthrough(&service).await?;
        }
    }

    Ok(())
}

async fn walkthrough<S: TokenStore>(service: &TokenLifecycleService<S>) -> Result<()> {
    let issued = service.issue_or_rotate("demo-user", "demo-password").await?;
    println!("issued token {} (stored: {})", mask_token(&issued.token), issued.success);

    let outcome = service.validate_by_uid("demo-user", &issued.token).await?;
    println!("validate by uid: {} ({})", outcome.status, outcome.status.response_code());

    let outcome = service.validate_token(&issued.token).await?;
    println!("validate token: {}", outcome.status);

    match service.refresh(&issued.refresh_token).await? {
        RefreshOutcome::Rotated(tokens) => println!("rotated to {}", mask_token(&tokens.token)),
        RefreshOutcome::Rejected(outcome) => println!("refresh rejected: {}", outcome.message),
    }

    let stale = service.validate_by_uid("demo-user", &issued.token).await?;
    println!("old token after rotation: {}", stale.status);

    service.revoke("demo-user").await?;
    println!("revoked");

    Ok(())
}
