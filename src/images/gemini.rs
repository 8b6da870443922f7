use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::images::{save_bytes_as_jpeg, save_bytes_as_png};

const SERVICE: &str = "Gemini";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        #[allow(dead_code)]
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

/// Image-editing wrapper over the Gemini `generateContent` endpoint: the
/// base line-art image plus the day prompt go in, one rendered image comes
/// back inline.
pub struct GeminiClient<'a> {
    http: &'a Client,
    api_key: String,
    model: String,
}

impl<'a> GeminiClient<'a> {
    pub fn new(http: &'a Client, config: &Config) -> Result<Self> {
        let api_key = config.require(&config.gemini_api_key, "GEMINI_API_KEY")?;
        Ok(GeminiClient {
            http,
            api_key: api_key.to_string(),
            model: config.gemini_image_model.clone(),
        })
    }

    fn redact_api_key(&self, text: &str) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            return text.to_string();
        }
        text.replace(key, "[redacted]")
    }

    /// Edits the base image with the given prompt and writes the result both
    /// as PNG (archive copy) and JPEG (thumbnail copy).
    pub async fn edit_image(
        &self,
        base_image_path: &Path,
        prompt: &str,
        png_out: &Path,
        jpeg_out: &Path,
    ) -> Result<PathBuf> {
        let image_bytes = tokio::fs::read(base_image_path).await?;
        let image_b64 = general_purpose::STANDARD.encode(image_bytes);

        let url = format!(
            "{API_BASE}/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": prompt },
                    { "inlineData": { "mimeType": "image/png", "data": image_b64 } },
                ],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": { "aspectRatio": "16:9" },
            },
        });

        info!("Gemini image edit via model {}", self.model);
        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                PipelineError::Upstream {
                    service: SERVICE,
                    status: err.status().map(|s| s.as_u16()),
                    message: self.redact_api_key(&err.to_string()),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                SERVICE,
                status.as_u16(),
                self.redact_api_key(&body),
            ));
        }

        let data: GeminiResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let image = first_inline_image(&data).ok_or_else(|| PipelineError::Upstream {
            service: SERVICE,
            status: None,
            message: "model returned no image part".to_string(),
        })?;
        debug!("Gemini returned inline image ({})", image.mime_type);

        let bytes = general_purpose::STANDARD
            .decode(&image.data)
            .map_err(|err| PipelineError::Upstream {
                service: SERVICE,
                status: None,
                message: format!("inline image is not valid base64: {err}"),
            })?;

        save_bytes_as_png(SERVICE, &bytes, png_out)?;
        save_bytes_as_jpeg(SERVICE, &bytes, jpeg_out)?;
        Ok(png_out.to_path_buf())
    }
}

fn first_inline_image(response: &GeminiResponse) -> Option<&GeminiInlineData> {
    for candidate in response.candidates.as_deref().unwrap_or(&[]) {
        let parts = candidate
            .content
            .as_ref()
            .and_then(|content| content.parts.as_deref())
            .unwrap_or(&[]);
        for part in parts {
            if let GeminiPart::InlineData { inline_data } = part {
                if inline_data.mime_type.starts_with("image/") {
                    return Some(inline_data);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_inline_image_skips_text_parts() {
        let raw = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here you go" },
                        { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
                    ]
                }
            }]
        }"#;
        let response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let image = first_inline_image(&response).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "QUJD");
    }

    #[test]
    fn first_inline_image_handles_empty_candidates() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(first_inline_image(&response).is_none());
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let mut config = Config::load().unwrap();
        config.gemini_api_key = String::new();
        let http = Client::new();
        assert!(matches!(
            GeminiClient::new(&http, &config),
            Err(PipelineError::Config(_))
        ));
    }
}
