use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use tracing::warn;

use super::models::{
    PostMessageRequest, PostMessageResponse, SlackError, SlackUser, UsersInfoResponse,
};
use crate::models::notification::KarmaNotification;

/// Slack Web API client for user lookups and channel messages
pub struct SlackClient {
    http_client: HttpClient,
    bot_token: String,
    base_url: String,
}

impl SlackClient {
    const DEFAULT_BASE_URL: &'static str = "https://slack.com/api";

    /// Create a new Slack Web API client
    pub fn new(bot_token: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            bot_token,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a new client with custom base URL (for testing)
    pub fn with_base_url(bot_token: String, base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            bot_token,
            base_url,
        }
    }

    /// Create default headers with authorization
    fn create_headers(&self) -> Result<HeaderMap, SlackError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.bot_token))
            .map_err(|e| SlackError::Request(format!("Failed to create auth header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Map a non-success HTTP status to an error
    async fn handle_error_response(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> SlackError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();
        if status_code >= 500 {
            warn!("Slack server error {}: {}", status_code, body_text);
        }
        SlackError::Http(status_code, body_text)
    }

    /// GET users.info
    ///
    /// Looks up a workspace user by provider id. Returns `Ok(None)` when the
    /// API answers `ok: false` (unknown user, deactivated token scope, etc.)
    /// so callers can treat an unresolved user as a non-fatal condition.
    pub async fn user_info(&self, user_id: &str) -> Result<Option<SlackUser>, SlackError> {
        let url = format!("{}/users.info", self.base_url);
        let headers = self.create_headers()?;

        let response = self
            .http_client
            .get(&url)
            .headers(headers)
            .query(&[("user", user_id)])
            .send()
            .await
            .map_err(|e| SlackError::Request(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .json::<UsersInfoResponse>()
            .await
            .map_err(|e| SlackError::Deserialization(format!("Failed to parse response: {}", e)))?;

        if body.ok {
            Ok(body.user)
        } else {
            Ok(None)
        }
    }

    /// POST chat.postMessage
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let url = format!("{}/chat.postMessage", self.base_url);
        let headers = self.create_headers()?;

        let body = PostMessageRequest {
            channel: channel.to_string(),
            text: text.to_string(),
        };

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::Request(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .json::<PostMessageResponse>()
            .await
            .map_err(|e| SlackError::Deserialization(format!("Failed to parse response: {}", e)))?;

        if body.ok {
            Ok(())
        } else {
            Err(SlackError::Api(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    /// Post the outcome of a karma pipeline run to the channel.
    ///
    /// Message order is fixed: give-limit, take-limit, self-give, self-take,
    /// then one line per affected user in batch order.
    pub async fn send_karma_notifications(
        &self,
        notification: &KarmaNotification,
    ) -> Result<(), SlackError> {
        let channel = &notification.channel;
        let from_user = &notification.from_user;

        if !notification.can_give_karma {
            self.post_message(
                channel,
                &format!(
                    "{} you have reached the meters' limit. Being too generous lately?",
                    from_user
                ),
            )
            .await?;
        }
        if !notification.can_take_karma {
            self.post_message(
                channel,
                &format!(
                    "{} you have reached the meters' limit. Being too mean lately?",
                    from_user
                ),
            )
            .await?;
        }
        if notification.given_karmas_to_himself {
            self.post_message(
                channel,
                &format!(
                    "{} you can't give meters to yourself. Apogee is watching you!.",
                    from_user
                ),
            )
            .await?;
        }
        if notification.taken_karmas_from_himself {
            self.post_message(
                channel,
                &format!(
                    "{} you can't take away meters from yourself. Apogee is watching you!.",
                    from_user
                ),
            )
            .await?;
        }
        for affected_user in &notification.affected_users {
            let delta = (affected_user.new_total - affected_user.old_total).abs();
            let direction = if affected_user.old_total <= affected_user.new_total {
                "increased"
            } else {
                "decreased"
            };
            self.post_message(
                channel,
                &format!(
                    "{}'s apogee {} by {} meters for a new value of {}.",
                    affected_user.to_user, direction, delta, affected_user.new_total
                ),
            )
            .await?;
        }

        Ok(())
    }
}
