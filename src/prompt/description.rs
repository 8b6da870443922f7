//! Older scene-description generator, kept for the text-to-image back-ends
//! that take a full scene description instead of an edit instruction. Same
//! bucketing cadence as the main resolver but with its own tables.

use crate::error::Result;
use crate::prompt::calendar::check_index;

const STYLES: [&str; 10] = [
    "Impressionist",
    "Cubist",
    "Baroque",
    "Art Deco",
    "Art Nouveau",
    "Pop Art",
    "Engraving",
    "Watercolor",
    "Anime",
    "Watercolor",
];

const PLACES: [&str; 10] = [
    "mountain at sunrise",
    "sun-dappled forest",
    "desert landscape",
    "Buddhist temple",
    "modern city rooftop",
    "candle-lit cave",
    "cosmic space",
    "underwater realm",
    "flowering garden",
    "abstract spiritual plane",
];

const CLOTHES: [&str; 10] = [
    "traditional Buddhist robe",
    "white yogic garments",
    "crimson ceremonial cloak",
    "golden spiritual attire",
    "modern minimalist outfit",
    "nothing but radiant energy",
    "mystical armor",
    "Indian dhoti and sash",
    "futuristic meditation suit",
    "transparent light body",
];

pub fn generate_description(index: i64) -> Result<String> {
    check_index(index)?;
    let i0 = (index - 1) as usize;

    let style = STYLES[i0 % STYLES.len()];
    let place = PLACES[(i0 / 10) % PLACES.len()];
    let clothing = CLOTHES[i0 / 100];

    Ok(format!(
        "A serene male meditator sits cross-legged in a {place}, rendered in the {style} style. \
         He wears a {clothing}, appropriate for the atmosphere and tradition. His posture is \
         upright and composed, exuding calmness and inner stillness.\n\
         \n\
         The figure's hands are held near the chest in a precise meditative gesture (Maha Gyan Mudra):\n\
         - The index fingers are extended and touch at the tips, forming a small upward-pointing triangle.\n\
         - The left hand is turned inward, palm facing the chest.\n\
         - The right hand is turned outward, palm facing away.\n\
         - The other fingers are curled inward into fists.\n\
         - The right thumb rests gently over the curled fingers, the left thumb is tucked in.\n\
         - Each hand must visibly include four anatomically correct fingers.\n\
         \n\
         The surrounding environment supports the contemplative mood, reinforcing the meditative \
         focus of the scene. The composition is balanced, drawing the viewer's attention to the \
         hands, face, and overall harmony of body and background.\n\
         \n\
         Above the figure, the title \"MASTER'S TOUCH MEDITATION\" arches gently, complementing \
         the mood and style of the artwork.\n\
         aspect ratio 16:9"
    ))
}
