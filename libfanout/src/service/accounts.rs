//! Connected-account management

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::publishers::{CredentialMode, SIMULATED_TOKEN_PREFIX};
use crate::store::AccountStore;
use crate::types::{ConnectedAccount, Platform};
use crate::{FanoutError, Result};

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
}

/// Account view safe to print: the token itself is never exposed
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub platform: Platform,
    pub connected: bool,
    pub simulated: bool,
    pub platform_user: Option<String>,
    pub updated_at: i64,
}

impl From<&ConnectedAccount> for AccountSummary {
    fn from(account: &ConnectedAccount) -> Self {
        Self {
            platform: account.platform,
            connected: account.connected,
            simulated: CredentialMode::of(account.token()) == CredentialMode::Simulated,
            platform_user: account.platform_user.clone(),
            updated_at: account.updated_at,
        }
    }
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Bind a token to the owner's platform slot, replacing any previous one
    pub async fn connect(
        &self,
        owner_id: &str,
        platform: Platform,
        access_token: String,
        platform_user: Option<String>,
    ) -> Result<AccountSummary> {
        if access_token.trim().is_empty() {
            return Err(FanoutError::Validation(
                "Access token cannot be empty".to_string(),
            ));
        }

        let mut account = ConnectedAccount::new(owner_id, platform, access_token);
        account.platform_user = platform_user.filter(|user| !user.is_empty());
        self.accounts.upsert_account(&account).await?;

        info!(owner_id, platform = platform.as_str(), "Account connected");
        Ok(AccountSummary::from(&account))
    }

    /// Connect with a generated simulated credential
    pub async fn connect_simulated(
        &self,
        owner_id: &str,
        platform: Platform,
    ) -> Result<AccountSummary> {
        self.connect(owner_id, platform, simulated_token(platform), None)
            .await
    }

    pub async fn disconnect(&self, owner_id: &str, platform: Platform) -> Result<bool> {
        let found = self.accounts.disconnect_account(owner_id, platform).await?;
        if found {
            info!(owner_id, platform = platform.as_str(), "Account disconnected");
        }
        Ok(found)
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<AccountSummary>> {
        let accounts = self.accounts.find_connected_accounts(owner_id).await?;
        Ok(accounts.iter().map(AccountSummary::from).collect())
    }
}

/// `mock_access_token_<platform>_<unix millis>`
pub fn simulated_token(platform: Platform) -> String {
    format!(
        "{}access_token_{}_{}",
        SIMULATED_TOKEN_PREFIX,
        platform.as_str(),
        chrono::Utc::now().timestamp_millis()
    )
}
