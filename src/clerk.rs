use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::IdentityUser;

const PAGE_SIZE: usize = 100;
const USER_AGENT: &str = "packzen-admin/1.0";

/// Client for the Clerk user-listing API.
pub struct ClerkClient {
    http: Client,
    api_base: String,
    secret_key: String,
}

/// Raw user record as returned by the API.
#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    created_at: i64,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    #[serde(default)]
    email_address: String,
}

/// Clerk has returned both a bare array and a `{"data": [...]}` wrapper for
/// this endpoint; both shapes are normalized here.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UsersPage {
    Bare(Vec<ClerkUser>),
    Wrapped { data: Vec<ClerkUser> },
}

impl UsersPage {
    fn into_users(self) -> Vec<ClerkUser> {
        match self {
            UsersPage::Bare(users) => users,
            UsersPage::Wrapped { data } => data,
        }
    }
}

impl From<ClerkUser> for IdentityUser {
    fn from(raw: ClerkUser) -> Self {
        let email = raw
            .email_addresses
            .into_iter()
            .next()
            .map(|e| e.email_address)
            .unwrap_or_default();
        IdentityUser {
            id: raw.id,
            email,
            created_at: format_created_at(raw.created_at),
        }
    }
}

/// Millisecond epoch to UTC `YYYY-MM-DD HH:MM:SS`. An out-of-range value
/// renders as the epoch.
fn format_created_at(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

impl ClerkClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            api_base: config.clerk_api_base.clone(),
            secret_key: config.clerk_secret_key.clone(),
        }
    }

    /// Fetches every user, one page at a time. Stops on the first page that
    /// comes back shorter than the page size. Any transport or decode error
    /// aborts the run; there is no retry.
    pub async fn fetch_all_users(&self) -> AppResult<Vec<IdentityUser>> {
        let mut users = Vec::new();
        let mut page = 1u32;

        loop {
            let batch = self.fetch_page(page).await?;
            let batch_len = batch.len();
            users.extend(batch.into_iter().map(IdentityUser::from));
            if batch_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        tracing::info!("Fetched {} Clerk users in {} page(s)", users.len(), page);
        Ok(users)
    }

    async fn fetch_page(&self, page: u32) -> AppResult<Vec<ClerkUser>> {
        let url = format!(
            "{}/v1/users?limit={}&page={}",
            self.api_base, PAGE_SIZE, page
        );
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Clerk user list failed: status={}, body={}", status, body);
            return Err(AppError::Api { status, body });
        }

        let users_page: UsersPage = response.json().await?;
        Ok(users_page.into_users())
    }
}
