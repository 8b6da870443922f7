use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::GenericImageView;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::Result;
use crate::images::JPEG_QUALITY;

// Stems exactly of the form "275_", nothing after the underscore.
static NUMBERED_STEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)_$").unwrap());

const TARGET_RATIO: f64 = 16.0 / 9.0;
const RATIO_EPS: f64 = 0.0015;

/// What a scan of the numbered source images found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReport {
    pub count: usize,
    pub range: Option<(i64, i64)>,
    pub missing: Vec<i64>,
}

fn numbered_png(path: &Path) -> Option<i64> {
    if path.extension().and_then(|ext| ext.to_str())? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let captures = NUMBERED_STEM.captures(stem)?;
    captures[1].parse().ok()
}

/// Scans a directory for `<number>_.png` files and reports which numbers in
/// the covered range are absent. Other files are ignored.
pub fn check_sequence(dir: &Path) -> Result<SequenceReport> {
    let mut numbers = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(number) = numbered_png(&path) {
            numbers.push(number);
        }
    }

    numbers.sort_unstable();
    numbers.dedup();

    let range = match (numbers.first(), numbers.last()) {
        (Some(&first), Some(&last)) => Some((first, last)),
        _ => None,
    };
    let missing = match range {
        Some((first, last)) => (first..=last)
            .filter(|n| numbers.binary_search(n).is_err())
            .collect(),
        None => Vec::new(),
    };

    Ok(SequenceReport {
        count: numbers.len(),
        range,
        missing,
    })
}

pub fn report_sequence(dir: &Path) -> Result<()> {
    let report = check_sequence(dir)?;
    match report.range {
        Some((first, last)) => {
            info!(
                "Found {} numbered images in {} covering {first}..{last}",
                report.count,
                dir.display()
            );
            if report.missing.is_empty() {
                info!("No gaps in the sequence");
            } else {
                info!("Missing numbers: {:?}", report.missing);
            }
        }
        None => info!("No numbered images found in {}", dir.display()),
    }
    Ok(())
}

/// Moves every `<number>_.png` in the directory into its `sora/`
/// subdirectory and returns the moved paths.
pub fn move_numbered(dir: &Path) -> Result<Vec<PathBuf>> {
    let target = dir.join("sora");
    fs::create_dir_all(&target)?;

    let mut moved = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || numbered_png(&path).is_none() {
            debug!("skip {}", path.display());
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        let destination = target.join(name);
        info!("{} -> sora/", path.display());
        fs::rename(&path, &destination)?;
        moved.push(destination);
    }

    Ok(moved)
}

/// Rows to trim from the top for a centered vertical crop to 16:9, plus the
/// resulting height. `None` when the image already matches the ratio or is
/// too short to reach it by trimming.
fn crop_bounds(width: u32, height: u32) -> Option<(u32, u32)> {
    let ratio = width as f64 / height as f64;
    if (ratio - TARGET_RATIO).abs() <= RATIO_EPS {
        return None;
    }

    let target_height = ((width as f64) * 9.0 / 16.0).round() as u32;
    if target_height >= height {
        return None;
    }

    let top = (height - target_height) / 2;
    Some((top, target_height))
}

/// Crops every `.jpg` in the directory to 16:9 by trimming the top and
/// bottom equally, rewriting files in place. Dry-run only logs what would
/// change. Returns the number of files cropped (or that would be).
pub fn crop_sources_to_16x9(dir: &Path, dry_run: bool) -> Result<usize> {
    let mut cropped = 0;

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("jpg")
        })
        .collect();
    paths.sort();

    for path in paths {
        let img = match image::open(&path) {
            Ok(img) => img,
            Err(err) => {
                info!("SKIP {}: not decodable ({err})", path.display());
                continue;
            }
        };
        let (width, height) = img.dimensions();

        let Some((top, target_height)) = crop_bounds(width, height) else {
            debug!("OK {}: {width}x{height}", path.display());
            continue;
        };

        cropped += 1;
        if dry_run {
            info!(
                "DRY {}: {width}x{height} -> {width}x{target_height}",
                path.display()
            );
            continue;
        }

        let trimmed = img.crop_imm(0, top, width, target_height);
        let file = fs::File::create(&path)?;
        let encoder = JpegEncoder::new_with_quality(file, JPEG_QUALITY);
        trimmed.to_rgb8().write_with_encoder(encoder).map_err(|err| {
            std::io::Error::other(format!("failed to rewrite {}: {err}", path.display()))
        })?;
        info!(
            "DONE {}: {width}x{height} -> {width}x{target_height}",
            path.display()
        );
    }

    Ok(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn empty_directory_yields_an_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = check_sequence(dir.path()).unwrap();
        assert_eq!(report.count, 0);
        assert_eq!(report.range, None);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn gaps_inside_the_covered_range_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "3_.png");
        touch(dir.path(), "5_.png");
        touch(dir.path(), "6_.png");

        let report = check_sequence(dir.path()).unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(report.range, Some((3, 6)));
        assert_eq!(report.missing, vec![4]);
    }

    #[test]
    fn only_bare_numbered_stems_count() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "3_.png");
        touch(dir.path(), "4_morning.png");
        touch(dir.path(), "notes.png");
        touch(dir.path(), "5_.jpg");
        touch(dir.path(), "_6.png");

        let report = check_sequence(dir.path()).unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.range, Some((3, 3)));
    }

    #[test]
    fn subdirectories_are_not_scanned() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "7_.png");
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "7_.png");

        let report = check_sequence(dir.path()).unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.range, Some((7, 7)));
        assert!(report.missing.is_empty());
    }

    #[test]
    fn move_numbered_relocates_only_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "1_.png");
        touch(dir.path(), "25_.png");
        touch(dir.path(), "2_extra.png");
        touch(dir.path(), "readme.txt");

        let moved = move_numbered(dir.path()).unwrap();
        assert_eq!(moved.len(), 2);
        assert!(dir.path().join("sora/1_.png").is_file());
        assert!(dir.path().join("sora/25_.png").is_file());
        assert!(dir.path().join("2_extra.png").is_file());
        assert!(!dir.path().join("1_.png").exists());
    }

    #[test]
    fn move_numbered_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "9_.png");
        assert_eq!(move_numbered(dir.path()).unwrap().len(), 1);
        assert_eq!(move_numbered(dir.path()).unwrap().len(), 0);
        assert!(dir.path().join("sora/9_.png").is_file());
    }

    #[test]
    fn crop_bounds_trims_tall_images_symmetrically() {
        // 1920x1080 is already 16:9.
        assert_eq!(crop_bounds(1920, 1080), None);
        // 1024x1536 portrait: target height 576, trim 480 from the top.
        assert_eq!(crop_bounds(1024, 1536), Some((480, 576)));
        // Wider than 16:9 cannot be fixed by a vertical trim.
        assert_eq!(crop_bounds(2000, 900), None);
    }

    #[test]
    fn crop_rewrites_tall_jpegs_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.jpg");
        let tall = image::DynamicImage::new_rgb8(160, 160);
        tall.save(&path).unwrap();

        assert_eq!(crop_sources_to_16x9(dir.path(), true).unwrap(), 1);
        let (w, h) = image::image_dimensions(&path).unwrap();
        assert_eq!((w, h), (160, 160), "dry run must not modify files");

        assert_eq!(crop_sources_to_16x9(dir.path(), false).unwrap(), 1);
        let (w, h) = image::image_dimensions(&path).unwrap();
        assert_eq!((w, h), (160, 90));

        // Second pass finds nothing left to crop.
        assert_eq!(crop_sources_to_16x9(dir.path(), false).unwrap(), 0);
    }
}
