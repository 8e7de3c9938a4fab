//! Discord webhook notifications

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::USER_AGENT;
use crate::report::{SUMMARY_TITLE, update_noun, updates_found};
use crate::update::outcome::{UpdateOutcome, UpdateReport};

/// Embed colour when at least one target was updated
pub const COLOR_UPDATES: u32 = 16705372;
/// Embed colour when nothing was updated
pub const COLOR_UP_TO_DATE: u32 = 5763719;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Build the webhook body for one pass
pub fn build_payload(reports: &[UpdateReport], username: &str, now: DateTime<Utc>) -> WebhookPayload {
    let count = updates_found(reports);
    let (color, description) = if count > 0 {
        (
            COLOR_UPDATES,
            format!(
                "**Found {} {}.** A server restart is required to apply.",
                count,
                update_noun(count)
            ),
        )
    } else {
        (
            COLOR_UP_TO_DATE,
            "**All plugins are up to date!**".to_string(),
        )
    };

    WebhookPayload {
        username: username.to_string(),
        embeds: vec![Embed {
            title: SUMMARY_TITLE.to_string(),
            description,
            color,
            fields: reports.iter().map(field).collect(),
            footer: EmbedFooter {
                text: format!("Check completed at {} UTC", now.format("%Y-%m-%d %H:%M:%S")),
            },
        }],
    }
}

fn field(report: &UpdateReport) -> EmbedField {
    let origin = report.origin.as_str();
    let (icon, value) = match &report.outcome {
        UpdateOutcome::Updated { from, to, .. } => {
            ("⬆️", format!("Updated from `v{}` to `v{}`", from, to))
        }
        UpdateOutcome::UpToDate { installed, .. } => {
            ("✅", format!("Is up to date (`v{}`)", installed))
        }
        other => (
            "❌",
            format!(
                "**Error:** {}",
                other.detail().map_or_else(|| other.to_string(), str::to_string)
            ),
        ),
    };

    EmbedField {
        name: format!("{} {} `[{}]`", icon, report.name, origin),
        value,
        inline: false,
    }
}

/// Posts pass summaries to a Discord webhook
pub struct DiscordNotifier {
    client: reqwest::Client,
    url: String,
    username: String,
}

impl DiscordNotifier {
    pub fn new(url: &str, username: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            username: username.to_string(),
        })
    }

    pub async fn notify(&self, reports: &[UpdateReport]) -> Result<(), NotifyError> {
        let payload = build_payload(reports, &self.username, Utc::now());
        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        debug!("Sent webhook notification for {} plugin(s)", reports.len());
        Ok(())
    }

    /// Like [`notify`](Self::notify), logging failures instead of returning them
    pub async fn send(&self, reports: &[UpdateReport]) {
        match self.notify(reports).await {
            Ok(()) => {}
            Err(NotifyError::Status(status)) => {
                warn!("Failed to send Discord webhook notification. Status: {}", status)
            }
            Err(e) => error!("An error occurred while sending the Discord webhook: {}", e),
        }
    }
}
