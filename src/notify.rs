//! Push notification for the run summary, delivered through a Bark-style
//! endpoint. Delivery is fire-and-forget: a failed push is logged and never
//! changes the process outcome.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_SERVER: &str = "https://api.day.app";
const PUSH_TIMEOUT: Duration = Duration::from_secs(15);

/// Named notification sounds the push service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifySound {
    #[default]
    Birdsong,
    Bell,
    Silence,
}

impl NotifySound {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifySound::Birdsong => "birdsong",
            NotifySound::Bell => "bell",
            NotifySound::Silence => "silence",
        }
    }
}

/// Push settings from the `bark` config section.
#[derive(Debug, Clone, Deserialize)]
pub struct BarkConfig {
    pub device_key: String,
    /// Push server base URL; defaults to the public Bark instance.
    pub server: Option<String>,
    #[serde(default)]
    pub sound: NotifySound,
}

#[derive(Serialize)]
struct PushBody<'a> {
    title: &'a str,
    body: &'a str,
    sound: &'a str,
    device_key: &'a str,
}

/// Sends run summaries to the configured push endpoint. The HTTP client is
/// built once and reused across sends.
pub struct Notifier {
    config: BarkConfig,
    client: Option<reqwest::Client>,
}

impl Notifier {
    pub fn new(config: BarkConfig) -> Self {
        let client = match reqwest::Client::builder().timeout(PUSH_TIMEOUT).build() {
            Ok(client) => Some(client),
            Err(err) => {
                warn!("push client unavailable, notifications disabled: {err}");
                None
            }
        };
        Self { config, client }
    }

    /// Pushes a titled multi-line body. Transport or server failures are
    /// logged at warn level and swallowed.
    pub async fn send(&self, title: &str, body: &str) {
        let Some(client) = &self.client else {
            return;
        };
        let server = self
            .config
            .server
            .as_deref()
            .unwrap_or(DEFAULT_SERVER)
            .trim_end_matches('/');
        let url = format!("{server}/push");
        let push = PushBody {
            title,
            body,
            sound: self.config.sound.as_str(),
            device_key: &self.config.device_key,
        };

        match client.post(&url).json(&push).send().await {
            Ok(response) if response.status().is_success() => {
                info!("push notification sent");
            }
            Ok(response) => {
                warn!("push notification rejected: HTTP {}", response.status().as_u16());
            }
            Err(err) => {
                warn!("push notification failed: {err}");
            }
        }
    }
}
