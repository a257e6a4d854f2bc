//! Discord REST implementation of [`Platform`].

use super::Platform;
use crate::config::ApiConfig;
use crate::error::PlatformError;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use std::time::Duration;
use stickyd_proto::{Channel, ChannelId, CreateMessage, Message, MessageId};
use tracing::debug;

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/sid3xyz/stickyd, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// REST client authenticated as a bot.
pub struct DiscordRest {
    http_client: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl DiscordRest {
    pub fn new(config: &ApiConfig, token: &str) -> Result<Self, PlatformError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("Bot {token}"),
        })
    }

    fn channel_url(&self, channel: &ChannelId) -> String {
        format!("{}/channels/{}", self.base_url, channel)
    }

    fn messages_url(&self, channel: &ChannelId) -> String {
        format!("{}/messages", self.channel_url(channel))
    }

    fn message_url(&self, channel: &ChannelId, message: &MessageId) -> String {
        format!("{}/{}", self.messages_url(channel), message)
    }
}

#[async_trait]
impl Platform for DiscordRest {
    async fn send_message(
        &self,
        channel: &ChannelId,
        message: &CreateMessage,
    ) -> Result<Message, PlatformError> {
        let response = self
            .http_client
            .post(self.messages_url(channel))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .json(message)
            .send()
            .await?;
        let sent: Message = check(response).await?.json().await?;
        debug!(channel = %channel, message = %sent.id, "Message sent");
        Ok(sent)
    }

    async fn fetch_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<Option<Message>, PlatformError> {
        let response = self
            .http_client
            .get(self.message_url(channel, message))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        match check(response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(PlatformError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_channel(&self, channel: &ChannelId) -> Result<Option<Channel>, PlatformError> {
        let response = self
            .http_client
            .get(self.channel_url(channel))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        match check(response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(PlatformError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), PlatformError> {
        let response = self
            .http_client
            .delete(self.message_url(channel, message))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        check(response).await?;
        debug!(channel = %channel, message = %message, "Message deleted");
        Ok(())
    }
}

/// Pass successful responses through; turn everything else into a [`PlatformError`].
async fn check(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
        response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("retry_after").and_then(|v| v.as_f64()))
    } else {
        None
    };
    Err(status_error(status, retry_after))
}

fn status_error(status: StatusCode, retry_after: Option<f64>) -> PlatformError {
    match status {
        StatusCode::NOT_FOUND => PlatformError::NotFound,
        StatusCode::FORBIDDEN => PlatformError::Forbidden,
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimited {
            retry_after: retry_after.unwrap_or(1.0),
        },
        other => PlatformError::Status {
            code: other.as_u16(),
        },
    }
}
