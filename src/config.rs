use std::env;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Which image-generation back-end `render` talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageBackend {
    Dezgo,
    Novita,
    OpenAi,
    Gemini,
}

impl ImageBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "dezgo" => Ok(ImageBackend::Dezgo),
            "novita" => Ok(ImageBackend::Novita),
            "openai" => Ok(ImageBackend::OpenAi),
            "gemini" => Ok(ImageBackend::Gemini),
            other => Err(PipelineError::invalid_argument(format!(
                "unknown image backend '{other}' (expected dezgo, novita, openai, or gemini)"
            ))),
        }
    }
}

/// All runtime configuration, read once from the environment (`.env` via
/// dotenvy) and passed down explicitly. Keys required by a specific service
/// are validated by that service's client constructor, so a missing
/// credential fails before any network call but does not block unrelated
/// subcommands.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub image_backend: ImageBackend,
    pub dezgo_api_key: String,
    pub dezgo_base_url: String,
    pub novita_api_key: String,
    pub novita_base_url: String,
    pub novita_timeout_seconds: u64,
    pub openai_api_key: String,
    pub openai_image_model: String,
    pub gemini_api_key: String,
    pub gemini_image_model: String,
    pub fb_page_id: String,
    pub fb_page_access_token: String,
    pub fb_graph_api_version: String,
    pub facebook_timeout: String,
    pub general_playlist_id: String,
    pub half_playlist_id: String,
    pub full_playlist_id: String,
    pub persistent_stream_id: String,
    pub yt_token_file: PathBuf,
    pub yt_token_revoked_flag: PathBuf,
    pub stream_start_time: String,
    pub sequence_dir: PathBuf,
    pub sources_dir: PathBuf,
    pub posted_streams_path: PathBuf,
    pub output_dir: PathBuf,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_path(name: &str, default: &str) -> PathBuf {
    PathBuf::from(env_string(name, default))
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            image_backend: ImageBackend::parse(&env_string("IMAGE_BACKEND", "gemini"))?,
            dezgo_api_key: env_string("DEZGO_API_KEY", ""),
            dezgo_base_url: env_string("DEZGO_BASE_URL", "https://api.dezgo.com"),
            novita_api_key: env_string("NOVITA_API_KEY", ""),
            novita_base_url: env_string("NOVITA_BASE_URL", "https://api.novita.ai/v3"),
            novita_timeout_seconds: env_u64("NOVITA_TIMEOUT_SECONDS", 90),
            openai_api_key: env_string("OPENAI_API_KEY", ""),
            openai_image_model: env_string("OPENAI_IMAGE_MODEL", "gpt-4o-mini"),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-2.5-flash-image"),
            fb_page_id: env_string("FB_PAGE_ID", ""),
            fb_page_access_token: env_string("FB_PAGE_ACCESS_TOKEN", ""),
            fb_graph_api_version: env_string("FB_GRAPH_API_VERSION", ""),
            facebook_timeout: env_string("FACEBOOK_TIMEOUT", ""),
            general_playlist_id: env_string("GENERAL_YT_PLAYLIST_ID", ""),
            half_playlist_id: env_string("HALF_MTM_PLAYLIST_ID", ""),
            full_playlist_id: env_string("FULL_MTM_PLAYLIST_ID", ""),
            persistent_stream_id: env_string("PERSISTENT_STREAM_ID", ""),
            yt_token_file: env_path("YT_TOKEN_FILE", "config/token_youtube.json"),
            yt_token_revoked_flag: env_path(
                "YT_TOKEN_REVOKED_FLAG",
                "config/.youtube_token_revoked",
            ),
            stream_start_time: env_string("STREAM_START_TIME", "10:00:00-04:00"),
            sequence_dir: env_path("SEQUENCE_DIR", "sequence"),
            sources_dir: env_path("SOURCES_DIR", "sources"),
            posted_streams_path: env_path("POSTED_STREAMS_PATH", "posted_streams.json"),
            output_dir: env_path("OUTPUT_DIR", "out"),
        })
    }

    /// Returns the value of a required key or a configuration error naming it.
    pub fn require<'a>(&self, value: &'a str, key: &str) -> Result<&'a str> {
        if value.trim().is_empty() {
            return Err(PipelineError::config(format!(
                "{key} is not set in .env or the environment"
            )));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_backend_parse_accepts_known_names() {
        assert_eq!(ImageBackend::parse("Dezgo").unwrap(), ImageBackend::Dezgo);
        assert_eq!(
            ImageBackend::parse(" novita ").unwrap(),
            ImageBackend::Novita
        );
        assert_eq!(ImageBackend::parse("OpenAI").unwrap(), ImageBackend::OpenAi);
        assert_eq!(ImageBackend::parse("gemini").unwrap(), ImageBackend::Gemini);
    }

    #[test]
    fn image_backend_parse_rejects_unknown_names() {
        assert!(matches!(
            ImageBackend::parse("dalle"),
            Err(PipelineError::InvalidArgument(_))
        ));
    }
}
