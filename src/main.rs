use std::env;

use user_audit::clerk::ClerkClient;
use user_audit::config::Config;
use user_audit::d1::D1Client;
use user_audit::report::{reconcile, render_report};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let project_root = env::current_dir()?;
    let config = Config::load(&project_root)?;

    tracing::info!("Fetching Clerk users...");
    let clerk = ClerkClient::new(&config);
    let clerk_users = clerk.fetch_all_users().await?;

    tracing::info!("Querying D1 database...");
    let d1 = D1Client::new(&config);
    let db_users = d1.fetch_user_summaries().await?;

    let rows = reconcile(&clerk_users, &db_users);
    print!("\n{}", render_report(&rows, clerk_users.len(), db_users.len()));

    Ok(())
}
