use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::images::save_bytes_as_jpeg;

const SERVICE: &str = "Dezgo";

/// Thin wrapper over the Dezgo image API. One request per call, no retries.
pub struct DezgoClient<'a> {
    http: &'a Client,
    api_key: String,
    base_url: String,
}

impl<'a> DezgoClient<'a> {
    pub fn new(http: &'a Client, config: &Config) -> Result<Self> {
        let api_key = config.require(&config.dezgo_api_key, "DEZGO_API_KEY")?;
        Ok(DezgoClient {
            http,
            api_key: api_key.to_string(),
            base_url: config.dezgo_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Text-to-image via SDXL; the API returns PNG bytes which are re-encoded
    /// as a 16:9 JPEG at `out_path`.
    pub async fn text_to_image_jpeg(
        &self,
        prompt: &str,
        out_path: &Path,
        width: u32,
        height: u32,
    ) -> Result<PathBuf> {
        let url = format!("{}/text2image_sdxl", self.base_url);
        let payload = json!({
            "prompt": prompt,
            "width": width,
            "height": height,
        });

        info!("Dezgo text2image request ({width}x{height})");
        let response = self
            .http
            .post(&url)
            .header("X-Dezgo-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(SERVICE, status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;
        save_bytes_as_jpeg(SERVICE, &bytes, out_path)?;
        Ok(out_path.to_path_buf())
    }

    /// ControlNet OpenPose edit with hand detection enabled, preserving the
    /// reference pose and mudra.
    pub async fn controlnet_openpose(
        &self,
        init_image_path: &Path,
        prompt: &str,
        out_path: &Path,
        width: u32,
        height: u32,
    ) -> Result<PathBuf> {
        let url = format!("{}/controlnet", self.base_url);
        let image_bytes = tokio::fs::read(init_image_path).await?;

        let init_part = Part::bytes(image_bytes)
            .file_name("init.png")
            .mime_str("image/png")
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let form = Form::new()
            .text("prompt", prompt.to_string())
            .text("width", width.to_string())
            .text("height", height.to_string())
            .text("detect_hands", "true")
            .part("init_image", init_part);

        info!("Dezgo controlnet request from {}", init_image_path.display());
        let response = self
            .http
            .post(&url)
            .header("X-Dezgo-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(SERVICE, status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;
        save_bytes_as_jpeg(SERVICE, &bytes, out_path)?;
        Ok(out_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let mut config = Config::load().unwrap();
        config.dezgo_api_key = String::new();
        let http = Client::new();
        assert!(matches!(
            DezgoClient::new(&http, &config),
            Err(PipelineError::Config(_))
        ));
    }
}
