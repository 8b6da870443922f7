use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{PipelineError, Result};

const SERVICE: &str = "Facebook";

/// Graph API page-post wrapper. All required configuration is validated in
/// the constructor so a missing credential surfaces before any request.
#[derive(Debug)]
pub struct FacebookClient<'a> {
    http: &'a Client,
    page_id: String,
    access_token: String,
    base_url: String,
    timeout: Duration,
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let seconds: f64 = raw.trim().parse().map_err(|_| {
        PipelineError::config("FACEBOOK_TIMEOUT must be a number greater than 0")
    })?;
    if seconds <= 0.0 {
        return Err(PipelineError::config(
            "FACEBOOK_TIMEOUT must be greater than 0",
        ));
    }
    Ok(Duration::from_secs_f64(seconds))
}

impl<'a> FacebookClient<'a> {
    pub fn new(http: &'a Client, config: &Config) -> Result<Self> {
        let missing: Vec<&str> = [
            ("FB_PAGE_ID", config.fb_page_id.as_str()),
            ("FB_PAGE_ACCESS_TOKEN", config.fb_page_access_token.as_str()),
            ("FB_GRAPH_API_VERSION", config.fb_graph_api_version.as_str()),
            ("FACEBOOK_TIMEOUT", config.facebook_timeout.as_str()),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(PipelineError::config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        debug!(
            "Facebook client for page {} (token {})",
            config.fb_page_id,
            mask_token(&config.fb_page_access_token)
        );

        Ok(FacebookClient {
            http,
            page_id: config.fb_page_id.clone(),
            access_token: config.fb_page_access_token.clone(),
            base_url: format!(
                "https://graph.facebook.com/{}",
                config.fb_graph_api_version
            ),
            timeout: parse_timeout(&config.facebook_timeout)?,
        })
    }

    pub fn feed_url(&self) -> String {
        format!("{}/{}/feed", self.base_url, self.page_id)
    }

    /// Publishes one post to the page feed and returns the post id.
    pub async fn create_post(&self, message: &str, link: Option<&str>) -> Result<String> {
        if message.trim().is_empty() {
            return Err(PipelineError::invalid_argument(
                "message is required for a Facebook post",
            ));
        }

        let mut payload: Vec<(&str, &str)> = vec![
            ("message", message),
            ("access_token", self.access_token.as_str()),
        ];
        if let Some(link) = link {
            payload.push(("link", link));
        }

        info!("Posting to Facebook page {}", self.page_id);
        let response = self
            .http
            .post(self.feed_url())
            .timeout(self.timeout)
            .form(&payload)
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let status = response.status();
        let data: Value = response.json().await.map_err(|err| {
            PipelineError::Upstream {
                service: SERVICE,
                status: Some(status.as_u16()),
                message: format!("invalid JSON response: {err}"),
            }
        })?;

        if !status.is_success() || data.get("error").is_some() {
            return Err(PipelineError::upstream(
                SERVICE,
                status.as_u16(),
                build_error_message(&data),
            ));
        }

        Ok(data
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string())
    }
}

fn build_error_message(data: &Value) -> String {
    let error = data.get("error");
    let mut parts = Vec::new();

    if let Some(kind) = error
        .and_then(|e| e.get("type"))
        .and_then(Value::as_str)
    {
        parts.push(format!("type {kind}"));
    }
    if let Some(code) = error.and_then(|e| e.get("code")).and_then(Value::as_i64) {
        parts.push(format!("code {code}"));
    }
    if let Some(message) = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        parts.push(message.to_string());
    }

    if parts.is_empty() {
        "unknown error response from Facebook".to_string()
    } else {
        parts.join(", ")
    }
}

/// Masks an access token for display in dry-run output. Counted in
/// characters, not bytes, so arbitrary token content stays safe to slice.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::load().unwrap();
        config.fb_page_id = "12345".to_string();
        config.fb_page_access_token = "token-value-longer".to_string();
        config.fb_graph_api_version = "v21.0".to_string();
        config.facebook_timeout = "15".to_string();
        config
    }

    #[test]
    fn constructor_lists_every_missing_variable() {
        let mut config = configured();
        config.fb_page_id = String::new();
        config.facebook_timeout = String::new();
        let http = Client::new();
        let err = FacebookClient::new(&http, &config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("FB_PAGE_ID"), "{message}");
        assert!(message.contains("FACEBOOK_TIMEOUT"), "{message}");
        assert!(!message.contains("FB_GRAPH_API_VERSION"), "{message}");
    }

    #[test]
    fn timeout_must_be_a_positive_number() {
        let http = Client::new();
        for bad in ["abc", "0", "-3"] {
            let mut config = configured();
            config.facebook_timeout = bad.to_string();
            assert!(
                matches!(
                    FacebookClient::new(&http, &config),
                    Err(PipelineError::Config(_))
                ),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn error_message_is_composed_from_graph_fields() {
        let data: Value = serde_json::from_str(
            r#"{ "error": { "type": "OAuthException", "code": 190, "message": "Invalid token" } }"#,
        )
        .unwrap();
        assert_eq!(
            build_error_message(&data),
            "type OAuthException, code 190, Invalid token"
        );
    }

    #[test]
    fn mask_token_keeps_only_the_edges() {
        assert_eq!(mask_token("short"), "*****");
        assert_eq!(mask_token("abcdefghijkl"), "abcd...ijkl");
    }

    #[test]
    fn mask_token_handles_multi_byte_characters() {
        assert_eq!(mask_token("ключключключ"), "ключ...ключ");
        assert_eq!(mask_token("токен"), "*****");
    }
}
