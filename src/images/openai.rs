use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use image::GenericImageView;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::images::save_bytes_as_jpeg;

const SERVICE: &str = "OpenAI";
const API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    result: Option<String>,
}

/// Image editing through the Responses API with the `image_generation` tool.
/// The base image goes in as a data URL; the tool size is picked from the
/// input's aspect ratio.
pub struct OpenAiClient<'a> {
    http: &'a Client,
    api_key: String,
    model: String,
}

fn to_data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Maps the input dimensions onto the sizes gpt-image-1 accepts: square
/// within 5 percent, otherwise landscape or portrait.
fn choose_size(width: u32, height: u32) -> &'static str {
    let ratio = width as f64 / height as f64;
    if (0.95..=1.05).contains(&ratio) {
        "1024x1024"
    } else if ratio > 1.0 {
        "1536x1024"
    } else {
        "1024x1536"
    }
}

fn first_image_result(response: &ResponsesResponse) -> Option<&str> {
    response
        .output
        .iter()
        .find(|item| item.kind == "image_generation_call")
        .and_then(|item| item.result.as_deref())
        .filter(|result| !result.is_empty())
}

impl<'a> OpenAiClient<'a> {
    pub fn new(http: &'a Client, config: &Config) -> Result<Self> {
        let api_key = config.require(&config.openai_api_key, "OPENAI_API_KEY")?;
        Ok(OpenAiClient {
            http,
            api_key: api_key.to_string(),
            model: config.openai_image_model.clone(),
        })
    }

    /// Edits the base image with the given prompt and writes the result as a
    /// JPEG at `out_path`.
    pub async fn edit_image(
        &self,
        base_image_path: &Path,
        prompt: &str,
        out_path: &Path,
    ) -> Result<PathBuf> {
        let image_bytes = tokio::fs::read(base_image_path).await?;
        let (width, height) =
            image::load_from_memory(&image_bytes)
                .map(|img| img.dimensions())
                .map_err(|err| {
                    PipelineError::invalid_argument(format!(
                        "base image {} is not a decodable image: {err}",
                        base_image_path.display()
                    ))
                })?;
        let size = choose_size(width, height);

        let payload = json!({
            "model": self.model,
            "input": [{
                "role": "user",
                "content": [
                    { "type": "input_text", "text": prompt },
                    { "type": "input_image", "image_url": to_data_url(&image_bytes) },
                ],
            }],
            "tools": [{ "type": "image_generation", "size": size }],
            "tool_choice": { "type": "image_generation" },
        });

        info!("OpenAI image edit via model {} (size {size})", self.model);
        let response = self
            .http
            .post(format!("{API_BASE}/responses"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(SERVICE, status.as_u16(), body));
        }

        let data: ResponsesResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let result = first_image_result(&data).ok_or_else(|| PipelineError::Upstream {
            service: SERVICE,
            status: None,
            message: "no image_generation_call result in response".to_string(),
        })?;

        let bytes = general_purpose::STANDARD
            .decode(result)
            .map_err(|err| PipelineError::Upstream {
                service: SERVICE,
                status: None,
                message: format!("image result is not valid base64: {err}"),
            })?;

        save_bytes_as_jpeg(SERVICE, &bytes, out_path)?;
        Ok(out_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_follows_the_input_aspect_ratio() {
        assert_eq!(choose_size(1024, 1024), "1024x1024");
        assert_eq!(choose_size(1000, 1024), "1024x1024");
        assert_eq!(choose_size(1920, 1080), "1536x1024");
        assert_eq!(choose_size(1080, 1920), "1024x1536");
    }

    #[test]
    fn first_image_result_skips_non_image_output() {
        let raw = r#"{
            "output": [
                { "type": "message" },
                { "type": "image_generation_call", "result": "QUJD" }
            ]
        }"#;
        let response: ResponsesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_image_result(&response), Some("QUJD"));
    }

    #[test]
    fn missing_or_empty_result_is_none() {
        let raw = r#"{ "output": [ { "type": "image_generation_call", "result": "" } ] }"#;
        let response: ResponsesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_image_result(&response), None);
        let empty: ResponsesResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(first_image_result(&empty), None);
    }

    #[test]
    fn data_url_carries_the_png_header() {
        assert_eq!(to_data_url(b"ABC"), "data:image/png;base64,QUJD");
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let mut config = Config::load().unwrap();
        config.openai_api_key = String::new();
        let http = Client::new();
        assert!(matches!(
            OpenAiClient::new(&http, &config),
            Err(PipelineError::Config(_))
        ));
    }
}
