use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::images::{save_bytes_as_jpeg, DEFAULT_NEGATIVE_PROMPT};

const SERVICE: &str = "Novita";
const MODEL_NAME: &str = "sd_xl_base_1.0.safetensors";
const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct TaskStartResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskResultResponse {
    task: TaskStatus,
    images: Option<Vec<TaskImage>>,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskImage {
    image_url: String,
}

/// Novita runs generation as asynchronous jobs: one request to start, then a
/// fixed-interval poll until the task reaches a terminal status or the
/// wall-clock budget runs out.
pub struct NovitaClient<'a> {
    http: &'a Client,
    api_key: String,
    base_url: String,
    timeout_seconds: u64,
}

impl<'a> NovitaClient<'a> {
    pub fn new(http: &'a Client, config: &Config) -> Result<Self> {
        let api_key = config.require(&config.novita_api_key, "NOVITA_API_KEY")?;
        Ok(NovitaClient {
            http,
            api_key: api_key.to_string(),
            base_url: config.novita_base_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.novita_timeout_seconds,
        })
    }

    async fn start_task(&self, endpoint: &str, request: serde_json::Value) -> Result<String> {
        let url = format!("{}/async/{endpoint}", self.base_url);
        let payload = json!({
            "extra": { "response_image_type": "jpeg" },
            "request": request,
        });

        let response = self
            .http
            .post(&url)
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

        let data: TaskStartResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;
        info!("Novita {endpoint} task started: {}", data.task_id);
        Ok(data.task_id)
    }

    pub async fn start_txt2img(
        &self,
        prompt: &str,
        negative_prompt: &str,
        width: u32,
        height: u32,
    ) -> Result<String> {
        self.start_task(
            "txt2img",
            json!({
                "prompt": prompt,
                "negative_prompt": negative_prompt,
                "model_name": MODEL_NAME,
                "width": width,
                "height": height,
                "image_num": 1,
                "steps": 25,
                "guidance_scale": 7.0,
                "sampler_name": "Euler a",
                "seed": -1,
            }),
        )
        .await
    }

    pub async fn start_img2img(
        &self,
        init_image_path: &Path,
        prompt: &str,
        negative_prompt: &str,
        width: u32,
        height: u32,
        strength: f32,
    ) -> Result<String> {
        let image_bytes = tokio::fs::read(init_image_path).await?;
        let image_b64 = general_purpose::STANDARD.encode(image_bytes);

        self.start_task(
            "img2img",
            json!({
                "prompt": prompt,
                "negative_prompt": negative_prompt,
                "model_name": MODEL_NAME,
                "width": width,
                "height": height,
                "steps": 20,
                "guidance_scale": 7.0,
                "sampler_name": "Euler a",
                "seed": -1,
                "image_num": 1,
                "image_base64": image_b64,
                "strength": strength,
            }),
        )
        .await
    }

    /// Polls until the task succeeds (returning the first image URL) or
    /// fails. Exceeding the configured wall-clock budget raises a timeout.
    pub async fn wait_task(&self, task_id: &str) -> Result<String> {
        let url = format!("{}/async/task-result", self.base_url);
        let deadline = Instant::now() + Duration::from_secs(self.timeout_seconds);

        loop {
            if Instant::now() > deadline {
                return Err(PipelineError::Timeout {
                    service: SERVICE,
                    seconds: self.timeout_seconds,
                });
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&[("task_id", task_id)])
                .send()
                .await
                .map_err(|err| PipelineError::transport(SERVICE, err))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(PipelineError::upstream(SERVICE, status.as_u16(), body));
            }

            let data: TaskResultResponse = response
                .json()
                .await
                .map_err(|err| PipelineError::transport(SERVICE, err))?;

            match data.task.status.as_str() {
                "TASK_STATUS_SUCCEED" => {
                    let images = data.images.unwrap_or_default();
                    let first = images.into_iter().next().ok_or_else(|| {
                        PipelineError::Upstream {
                            service: SERVICE,
                            status: None,
                            message: format!("task {task_id} succeeded without images"),
                        }
                    })?;
                    return Ok(first.image_url);
                }
                "TASK_STATUS_FAILED" => {
                    let reason = data.task.reason.unwrap_or_else(|| "unknown".to_string());
                    return Err(PipelineError::Upstream {
                        service: SERVICE,
                        status: None,
                        message: format!("task {task_id} failed: {reason}"),
                    });
                }
                other => {
                    debug!("Novita task {task_id} status: {other}");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }

    async fn download_to_file(&self, image_url: &str, out_path: &Path) -> Result<PathBuf> {
        let response = self
            .http
            .get(image_url)
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::upstream(
                SERVICE,
                status.as_u16(),
                format!("image download failed for {image_url}"),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;
        save_bytes_as_jpeg(SERVICE, &bytes, out_path)?;
        Ok(out_path.to_path_buf())
    }

    /// Full text-to-image cycle: start, wait, download.
    pub async fn generate_to_file(
        &self,
        prompt: &str,
        out_path: &Path,
        width: u32,
        height: u32,
    ) -> Result<PathBuf> {
        let task_id = self
            .start_txt2img(prompt, DEFAULT_NEGATIVE_PROMPT, width, height)
            .await?;
        let image_url = self.wait_task(&task_id).await?;
        self.download_to_file(&image_url, out_path).await
    }

    /// Full image-to-image cycle. Strength stays low by default so the base
    /// geometry does not drift.
    pub async fn edit_to_file(
        &self,
        init_image_path: &Path,
        prompt: &str,
        out_path: &Path,
        width: u32,
        height: u32,
    ) -> Result<PathBuf> {
        let task_id = self
            .start_img2img(
                init_image_path,
                prompt,
                DEFAULT_NEGATIVE_PROMPT,
                width,
                height,
                0.45,
            )
            .await?;
        let image_url = self.wait_task(&task_id).await?;
        self.download_to_file(&image_url, out_path).await
    }
}
