use crate::error::Result;
use crate::prompt::appearance::{appearance_line, appearance_negatives};
use crate::prompt::calendar::{check_index, day_label};
use crate::prompt::params::{CoreParams, View};
use crate::prompt::tables::TITLE;

const FRONT_BASE_NEGATIVES: [&str; 5] = [
    "Do not change the pose or proportions.",
    "Do not add extra fingers or thumbs.",
    "Do not remove, distort, or misspell the title or subtitle.",
    "Avoid warped typography and background clutter.",
    "Produce a crisp, refined illustration with no artifacts or watermarks.",
];

const BACK_BASE_NEGATIVES: [&str; 6] = [
    "Do not change the pose or proportions.",
    "Do not show hands or fingers from behind.",
    "Do not add extra limbs.",
    "Do not remove, distort, or misspell the title or subtitle.",
    "Avoid warped typography and background clutter.",
    "Produce a crisp, refined illustration with no artifacts or watermarks.",
];

const MUDRA_BLOCK: &str = "Hands/mudra: show exactly four visible fingers on each hand; index fingers extended and touching at their tips to form a small upward-pointing triangle; middle, ring, and pinky curled inward; thumbs hidden. Hands at chest level.";

/// Title and day-subtitle instructions, phrased per view.
fn title_block(view: View, index: i64) -> Result<String> {
    let label = day_label(index)?;
    Ok(match view {
        View::Back => format!(
            "Keep the arched title exactly as \u{201c}{TITLE}\u{201d} with the same arc, spacing, and spelling.\nAdd a clearly legible subtitle just below the title that reads \u{201c}{label}\u{201d}."
        ),
        View::Front => format!(
            "Typography: keep the arched title \u{201c}{TITLE}\u{201d} and add a clear subtitle under it that reads \u{201c}{label}\u{201d}."
        ),
    })
}

fn front_prompt(index: i64) -> Result<String> {
    let params = CoreParams::resolve(index)?;
    let titles = title_block(View::Front, index)?;
    let appearance = appearance_line(index, View::Front)?;
    let extra_negatives = appearance_negatives(index, View::Front)?;

    let mut prompt = format!(
        "Re-render as a {style}.\n\
         Front view. Setting: {place}.\n\
         Clothing: {clothing}.\n\
         {appearance}\n\
         Atmosphere/lighting: {atmosphere}.\n\
         Aspect ratio 3:2. Single static illustration (no animation). High quality, clean edges.\n\
         \n\
         {titles}\n\
         \n\
         {MUDRA_BLOCK}",
        style = params.style,
        place = params.place,
        clothing = params.clothing,
        atmosphere = params.atmosphere,
    );

    prompt.push_str("\n\n");
    push_negatives(&mut prompt, &FRONT_BASE_NEGATIVES, &extra_negatives);
    Ok(prompt)
}

fn back_prompt(index: i64) -> Result<String> {
    let params = CoreParams::resolve(index)?;
    let titles = title_block(View::Back, index)?;
    let appearance = appearance_line(index, View::Back)?;
    let extra_negatives = appearance_negatives(index, View::Back)?;

    let mut prompt = format!(
        "Use the uploaded black-and-white line-art image of the monk and arched title as the base reference.\n\
         STRICTLY preserve pose and composition: back view; elbows bent; forearms forward; hands are in front of the chest and NOT visible from behind.\n\
         {titles}\n\
         \n\
         Re-render as a {style}.\n\
         Setting: {place}.\n\
         Clothing: {clothing}.\n\
         {appearance}\n\
         Atmosphere/lighting: {atmosphere}.\n\
         Aspect ratio 16:9. Single static illustration (no animation). High quality, clean edges.",
        style = params.style,
        place = params.place,
        clothing = params.clothing,
        atmosphere = params.atmosphere,
    );

    prompt.push_str("\n\n");
    push_negatives(&mut prompt, &BACK_BASE_NEGATIVES, &extra_negatives);
    Ok(prompt)
}

fn push_negatives(prompt: &mut String, base: &[&str], extra: &[String]) {
    let mut lines: Vec<&str> = base.to_vec();
    lines.extend(extra.iter().map(String::as_str));
    prompt.push_str(&lines.join("\n"));
}

/// Full image-editing prompt for one day and view.
pub fn generate_prompt(index: i64, view: View) -> Result<String> {
    check_index(index)?;
    match view {
        View::Front => front_prompt(index),
        View::Back => back_prompt(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_deterministic_per_index_and_view() {
        for view in [View::Front, View::Back] {
            assert_eq!(
                generate_prompt(308, view).unwrap(),
                generate_prompt(308, view).unwrap()
            );
        }
    }

    #[test]
    fn front_prompt_carries_title_day_label_and_mudra() {
        let prompt = generate_prompt(1, View::Front).unwrap();
        assert!(prompt.contains(TITLE));
        assert!(prompt.contains("Day 1 of 1000"));
        assert!(prompt.contains("Hands/mudra"));
        assert!(prompt.contains("Aspect ratio 3:2"));
    }

    #[test]
    fn back_prompt_preserves_reference_and_hides_hands() {
        let prompt = generate_prompt(7, View::Back).unwrap();
        assert!(prompt.contains("base reference"));
        assert!(prompt.contains("NOT visible from behind"));
        assert!(prompt.contains("Do not show hands or fingers from behind."));
        assert!(prompt.contains("Aspect ratio 16:9"));
        assert!(!prompt.contains("Hands/mudra"));
    }

    #[test]
    fn day_twelve_front_prompt_matches_the_worked_example() {
        let prompt = generate_prompt(12, View::Front).unwrap();
        assert!(prompt.contains("turban"));
        assert!(prompt.contains("Facial hair"));
        assert!(prompt.contains("Do not show head hair outside the turban."));
        assert!(!prompt.contains("Do not add a beard."));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        for invalid in [0, 1001, -5] {
            assert!(generate_prompt(invalid, View::Front).is_err());
            assert!(generate_prompt(invalid, View::Back).is_err());
        }
    }
}
