use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};

const SERVICE: &str = "YouTube OAuth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Stored credentials, mirroring the Google authorized-user JSON layout so a
/// token minted by external tooling can be dropped in as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// The revoked flag only counts while it is newer than the token file:
/// dropping in a fresh token clears the block without deleting the flag.
fn flag_is_active(flag_path: &Path, token_path: &Path) -> bool {
    let (Some(flag_time), Some(token_time)) = (modified_time(flag_path), modified_time(token_path))
    else {
        return false;
    };
    token_time <= flag_time
}

fn mark_token_revoked(flag_path: &Path) -> Result<()> {
    if flag_path.exists() {
        return Ok(());
    }
    if let Some(parent) = flag_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(flag_path, "revoked\n")?;
    warn!("YouTube OAuth refresh token revoked; manual re-auth required");
    Ok(())
}

fn clear_revoked_flag(flag_path: &Path) {
    if flag_path.exists() {
        let _ = fs::remove_file(flag_path);
    }
}

fn read_stored_token(token_path: &Path) -> Result<StoredToken> {
    let raw = fs::read_to_string(token_path).map_err(|err| {
        PipelineError::config(format!(
            "cannot read YouTube token file {}: {err}; authorize manually first",
            token_path.display()
        ))
    })?;
    serde_json::from_str(&raw).map_err(|err| {
        PipelineError::config(format!(
            "YouTube token file {} is malformed: {err}",
            token_path.display()
        ))
    })
}

fn write_stored_token(token_path: &Path, token: &StoredToken) -> Result<()> {
    if let Some(parent) = token_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(token).map_err(|err| {
        PipelineError::config(format!("cannot serialize YouTube token: {err}"))
    })?;
    fs::write(token_path, raw)?;
    Ok(())
}

fn token_still_valid(token: &StoredToken) -> bool {
    let Some(access) = token.token.as_deref() else {
        return false;
    };
    if access.trim().is_empty() {
        return false;
    }
    match token.expiry {
        Some(expiry) => Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECONDS) < expiry,
        None => false,
    }
}

/// Returns a usable access token, refreshing through the OAuth2 token
/// endpoint when the stored one is missing or expired. A revoked grant
/// writes the flag file and becomes a configuration error; there is no
/// interactive consent flow here.
pub async fn load_access_token(http: &Client, config: &Config) -> Result<String> {
    let token_path = config.yt_token_file.as_path();
    let flag_path = config.yt_token_revoked_flag.as_path();

    if flag_is_active(flag_path, token_path) {
        return Err(PipelineError::config(
            "YouTube refresh token is marked revoked; re-authorize and replace the token file",
        ));
    }

    let mut stored = read_stored_token(token_path)?;
    if token_still_valid(&stored) {
        return Ok(stored.token.clone().unwrap_or_default());
    }

    let refresh_token = stored
        .refresh_token
        .clone()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            PipelineError::config(
                "YouTube token file has no refresh_token; re-authorize manually",
            )
        })?;

    let token_uri = stored
        .token_uri
        .clone()
        .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

    info!("Refreshing YouTube access token");
    let response = http
        .post(&token_uri)
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", stored.client_id.as_str()),
            ("client_secret", stored.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
        ])
        .send()
        .await
        .map_err(|err| PipelineError::transport(SERVICE, err))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if body.contains("invalid_grant") {
            mark_token_revoked(flag_path)?;
            return Err(PipelineError::config(
                "YouTube refresh token was revoked (invalid_grant); re-authorize manually",
            ));
        }
        return Err(PipelineError::upstream(SERVICE, status.as_u16(), body));
    }

    let refreshed: RefreshResponse = response
        .json()
        .await
        .map_err(|err| PipelineError::transport(SERVICE, err))?;

    stored.token = Some(refreshed.access_token.clone());
    stored.expiry = refreshed
        .expires_in
        .map(|seconds| Utc::now() + Duration::seconds(seconds));
    write_stored_token(token_path, &stored)?;
    clear_revoked_flag(flag_path);

    Ok(refreshed.access_token)
}
