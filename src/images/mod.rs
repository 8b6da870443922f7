pub mod dezgo;
pub mod gemini;
pub mod novita;
pub mod openai;

use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;

use crate::error::{PipelineError, Result};

pub const JPEG_QUALITY: u8 = 95;

/// Default negative prompt for the Stable Diffusion back-ends.
pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "bad hands, extra fingers, deformed fingers, missing fingers";

/// Decodes generator output and writes it as an RGB JPEG, creating parent
/// directories as needed. A payload the `image` crate cannot decode counts
/// as a malformed upstream response.
pub fn save_bytes_as_jpeg(service: &'static str, bytes: &[u8], out_path: &Path) -> Result<()> {
    let decoded = image::load_from_memory(bytes).map_err(|err| PipelineError::Upstream {
        service,
        status: None,
        message: format!("response is not a decodable image: {err}"),
    })?;

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = fs::File::create(out_path)?;
    let encoder = JpegEncoder::new_with_quality(file, JPEG_QUALITY);
    decoded
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|err| {
            PipelineError::Io(std::io::Error::other(format!(
                "failed to encode JPEG {}: {err}",
                out_path.display()
            )))
        })
}

/// Writes generator output verbatim as PNG, creating parent directories.
pub fn save_bytes_as_png(service: &'static str, bytes: &[u8], out_path: &Path) -> Result<()> {
    let decoded = image::load_from_memory(bytes).map_err(|err| PipelineError::Upstream {
        service,
        status: None,
        message: format!("response is not a decodable image: {err}"),
    })?;

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    decoded.save(out_path).map_err(|err| {
        PipelineError::Io(std::io::Error::other(format!(
            "failed to write PNG {}: {err}",
            out_path.display()
        )))
    })
}
