//! Freeform card-prompt generator driven by editable word-list files.
//!
//! Unlike the main resolver this one is intentionally non-deterministic: it
//! picks variants at random so the operator can curate the lists without
//! touching code. It never feeds the deterministic pipeline.

use std::fs;
use std::path::Path;

use chrono::{Datelike, Weekday};
use rand::seq::IndexedRandom;

use crate::error::{PipelineError, Result};
use crate::prompt::calendar::{day_label, index_to_date};
use crate::prompt::tables::TITLE;

const SUNDAY_PALETTE: &str = "only red tones";

/// One variant per non-empty line.
fn load_variants(sources_dir: &Path, filename: &str) -> Result<Vec<String>> {
    let path = sources_dir.join(filename);
    let raw = fs::read_to_string(&path).map_err(|err| {
        PipelineError::config(format!(
            "cannot read word list {}: {err}",
            path.display()
        ))
    })?;

    let variants: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if variants.is_empty() {
        return Err(PipelineError::config(format!(
            "word list {} is empty",
            path.display()
        )));
    }
    Ok(variants)
}

fn choose(variants: &[String]) -> &str {
    variants
        .choose(&mut rand::rng())
        .map(String::as_str)
        .unwrap_or_default()
}

fn hair_file_for_gender(gender: &str) -> &'static str {
    if gender.eq_ignore_ascii_case("female") {
        "hair_female.txt"
    } else {
        "hair_male.txt"
    }
}

pub fn generate_card_prompt(sources_dir: &Path, index: i64) -> Result<String> {
    let date = index_to_date(index)?;
    let label = day_label(index)?;

    let genders = load_variants(sources_dir, "genders.txt")?;
    let styles = load_variants(sources_dir, "styles.txt")?;
    let locations = load_variants(sources_dir, "locations.txt")?;
    let clothes = load_variants(sources_dir, "clothes.txt")?;
    let palettes = load_variants(sources_dir, "palette.txt")?;

    let gender = choose(&genders).to_string();
    let hair = load_variants(sources_dir, hair_file_for_gender(&gender))?;

    // Sundays are always rendered in red regardless of the palette list.
    let palette = if date.weekday() == Weekday::Sun {
        SUNDAY_PALETTE
    } else {
        choose(&palettes)
    };

    Ok(format!(
        "Redraw the image in the style of: {style}\n\
         Text: keep the arched title \"{TITLE}\". Add a clear subtitle below it that reads \"{label}\". \
         The title and subtitle must contrast with the background.\n\
         Gender: {gender}\n\
         Location: {location}\n\
         Clothing: {clothing}\n\
         Hair: {hair}\n\
         Color palette: {palette}\n\
         Orientation: landscape",
        style = choose(&styles),
        location = choose(&locations),
        clothing = choose(&clothes),
        hair = choose(&hair),
    ))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::prompt::calendar::{date_to_index, EPOCH};
    use chrono::Duration;

    fn write_sources(dir: &Path) {
        for (name, content) in [
            ("genders.txt", "male\nfemale\n"),
            ("styles.txt", "watercolor\n"),
            ("locations.txt", "forest\n"),
            ("clothes.txt", "robe\n"),
            ("palette.txt", "cool blues\n"),
            ("hair_male.txt", "short hair\n"),
            ("hair_female.txt", "long hair\n"),
        ] {
            fs::write(dir.join(name), content).unwrap();
        }
    }

    fn first_sunday_index() -> i64 {
        let mut date = EPOCH;
        while date.weekday() != Weekday::Sun {
            date += Duration::days(1);
        }
        date_to_index(date).unwrap()
    }

    #[test]
    fn sunday_forces_the_red_palette() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        let prompt = generate_card_prompt(dir.path(), first_sunday_index()).unwrap();
        assert!(prompt.contains(SUNDAY_PALETTE), "{prompt}");
    }

    #[test]
    fn weekday_uses_the_palette_list() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        let prompt = generate_card_prompt(dir.path(), first_sunday_index() + 1).unwrap();
        assert!(prompt.contains("cool blues"), "{prompt}");
    }

    #[test]
    fn missing_word_list_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            generate_card_prompt(dir.path(), 1),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn empty_word_list_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        fs::write(dir.path().join("styles.txt"), "\n\n").unwrap();
        assert!(matches!(
            generate_card_prompt(dir.path(), 1),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn prompt_carries_title_and_day_label() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        let prompt = generate_card_prompt(dir.path(), 308).unwrap();
        assert!(prompt.contains(TITLE));
        assert!(prompt.contains("Day 308 of 1000"));
    }
}
