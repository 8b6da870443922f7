use std::path::PathBuf;

use reqwest::Client;
use tracing::info;

use crate::config::{Config, ImageBackend};
use crate::error::{PipelineError, Result};
use crate::images::dezgo::DezgoClient;
use crate::images::gemini::GeminiClient;
use crate::images::novita::NovitaClient;
use crate::images::openai::OpenAiClient;
use crate::prompt::assembler::generate_prompt;
use crate::prompt::params::View;

// SDXL-friendly resolutions close to the prompt's declared aspect ratios.
const FRONT_WIDTH: u32 = 1216;
const FRONT_HEIGHT: u32 = 832;
const BACK_WIDTH: u32 = 1344;
const BACK_HEIGHT: u32 = 768;

fn view_dimensions(view: View) -> (u32, u32) {
    match view {
        View::Front => (FRONT_WIDTH, FRONT_HEIGHT),
        View::Back => (BACK_WIDTH, BACK_HEIGHT),
    }
}

fn base_image_path(config: &Config, view: View) -> PathBuf {
    config
        .sources_dir
        .join(format!("{}_base.png", view.as_str()))
}

fn output_path(config: &Config, view: View, index: i64, extension: &str) -> PathBuf {
    config
        .output_dir
        .join(format!("{}_{index:03}.{extension}", view.as_str()))
}

/// Renders one day/view pair with the configured back-end and returns the
/// written file. Front renders start from the pose reference image so the
/// mudra survives; back renders for Dezgo and Novita are pure text-to-image.
pub async fn render_for_day(
    http: &Client,
    config: &Config,
    index: i64,
    view: View,
) -> Result<PathBuf> {
    let prompt = generate_prompt(index, view)?;
    let (width, height) = view_dimensions(view);
    let base_image = base_image_path(config, view);
    let jpeg_out = output_path(config, view, index, "jpg");

    if !config.output_dir.is_dir() {
        std::fs::create_dir_all(&config.output_dir)?;
    }

    info!(
        "Rendering day {index} {} via {:?}",
        view.as_str(),
        config.image_backend
    );

    let written = match config.image_backend {
        ImageBackend::Dezgo => {
            let dezgo = DezgoClient::new(http, config)?;
            match view {
                View::Front => {
                    require_base_image(&base_image)?;
                    dezgo
                        .controlnet_openpose(&base_image, &prompt, &jpeg_out, width, height)
                        .await?
                }
                View::Back => {
                    dezgo
                        .text_to_image_jpeg(&prompt, &jpeg_out, width, height)
                        .await?
                }
            }
        }
        ImageBackend::Novita => {
            let novita = NovitaClient::new(http, config)?;
            match view {
                View::Front => {
                    require_base_image(&base_image)?;
                    novita
                        .edit_to_file(&base_image, &prompt, &jpeg_out, width, height)
                        .await?
                }
                View::Back => {
                    novita
                        .generate_to_file(&prompt, &jpeg_out, width, height)
                        .await?
                }
            }
        }
        ImageBackend::OpenAi => {
            require_base_image(&base_image)?;
            let openai = OpenAiClient::new(http, config)?;
            openai.edit_image(&base_image, &prompt, &jpeg_out).await?
        }
        ImageBackend::Gemini => {
            require_base_image(&base_image)?;
            let gemini = GeminiClient::new(http, config)?;
            let png_out = output_path(config, view, index, "png");
            gemini
                .edit_image(&base_image, &prompt, &png_out, &jpeg_out)
                .await?
        }
    };

    info!("Wrote {}", written.display());
    Ok(written)
}

fn require_base_image(path: &std::path::Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::config(format!(
            "base image {} is missing",
            path.display()
        )))
    }
}
