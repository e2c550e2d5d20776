//! Per-account orchestration. Accounts are processed strictly in config
//! order, one at a time; every outcome is folded into an [`AccountResult`] so
//! one account's failure can never end the run early.

use serde_json::Value;
use tracing::{error, info, warn};

use crate::client::{WpsClient, DEFAULT_BASE_URL};
use crate::config::AccountConfig;

const DEFAULT_PLATFORM: u32 = 64;
const UNNAMED_ACCOUNT: &str = "unnamed account";

/// Outcome of one account's sign-in attempt.
#[derive(Debug, Clone)]
pub struct AccountResult {
    pub account_name: String,
    pub success: bool,
    pub message: String,
    pub sign_info: Value,
}

impl AccountResult {
    fn failure(account_name: &str, message: impl Into<String>) -> Self {
        Self {
            account_name: account_name.to_string(),
            success: false,
            message: message.into(),
            sign_info: Value::Null,
        }
    }
}

/// Count-based view over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub fn summarize(results: &[AccountResult]) -> RunSummary {
    let succeeded = results.iter().filter(|r| r.success).count();
    RunSummary {
        total: results.len(),
        succeeded,
        failed: results.len() - succeeded,
    }
}

/// Renders the notification body: a fixed five-line header (counts, a blank
/// separator, and the details heading) followed by one line per account.
pub fn render_report(results: &[AccountResult]) -> String {
    let summary = summarize(results);
    let mut lines = vec![
        format!("accounts processed: {}", summary.total),
        format!("sign-in succeeded: {}", summary.succeeded),
        format!("sign-in failed: {}", summary.failed),
        String::new(),
        "details:".to_string(),
    ];
    for result in results {
        let status = if result.success { "ok" } else { "failed" };
        lines.push(format!("{}: {} - {}", result.account_name, status, result.message));
    }
    lines.join("\n")
}

/// Drives the sign-in flow across all configured accounts.
pub struct CheckinRunner {
    accounts: Vec<AccountConfig>,
    base_url: String,
}

impl CheckinRunner {
    pub fn new(accounts: Vec<AccountConfig>) -> Self {
        Self {
            accounts,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points every per-account client at a different host; tests use this
    /// to target a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Processes every account sequentially and returns one result per
    /// account in input order.
    pub async fn run(&self) -> Vec<AccountResult> {
        info!("starting check-in for {} account(s)", self.accounts.len());
        let mut results = Vec::with_capacity(self.accounts.len());
        for account in &self.accounts {
            results.push(self.process_account(account).await);
        }
        results
    }

    async fn process_account(&self, account: &AccountConfig) -> AccountResult {
        let name = account.account_name.as_deref().unwrap_or(UNNAMED_ACCOUNT);
        info!("processing account: {name}");

        let Some(user_id) = account.user_id else {
            warn!("{name}: account config is missing user_id, skipping sign-in");
            return AccountResult::failure(name, "account config is missing user_id");
        };
        if account.cookies.is_empty() {
            error!("{name}: account config is missing cookies");
            return AccountResult::failure(name, "account config is missing cookies");
        }

        let client = match WpsClient::new(&account.cookies, account.user_agent.as_deref()) {
            Ok(client) => client.with_base_url(&self.base_url),
            Err(err) => {
                error!("{name}: client setup failed: {err}");
                return AccountResult::failure(name, format!("client setup failed: {err}"));
            }
        };

        let platform = account.platform.unwrap_or(DEFAULT_PLATFORM);
        match client.sign_in(user_id, platform).await {
            Ok(sign_info) => {
                info!("{name}: sign-in succeeded");
                AccountResult {
                    account_name: name.to_string(),
                    success: true,
                    message: "sign-in succeeded".to_string(),
                    sign_info,
                }
            }
            Err(err) => {
                error!("{name}: sign-in failed: {err}");
                AccountResult::failure(name, format!("{err}"))
            }
        }
    }
}

/// Logs the post-run summary block.
pub fn log_summary(results: &[AccountResult]) {
    let summary = summarize(results);
    info!("accounts processed: {}", summary.total);
    info!("sign-in succeeded: {}", summary.succeeded);
    info!("sign-in failed: {}", summary.failed);
    for result in results {
        let status = if result.success { "ok" } else { "failed" };
        info!("  {}: {} - {}", result.account_name, status, result.message);
    }
}
