//! Fixed parameter tables driving the deterministic prompt resolver.
//!
//! Order matters: the bucketing arithmetic in `params` and `appearance`
//! indexes into these tables, so reordering entries changes every prompt
//! from that day onward.

/// Arched title reproduced verbatim in every prompt and video title.
pub const TITLE: &str = "MASTER'S TOUCH MEDITATION";

/// Cycles daily.
pub const STYLES: [&str; 10] = [
    "anime-style illustration",
    "Impressionist illustration",
    "Cubist illustration",
    "Art Deco poster-style illustration",
    "Art Nouveau illustration",
    "Pop Art graphic illustration",
    "engraving-style illustration",
    "watercolor illustration",
    "minimalist line-art illustration",
    "technical line drawing",
];

/// Changes every 10 days.
pub const PLACES: [&str; 10] = [
    "shallow water with gentle ripples fading toward misty mountains and a tiny tree-covered island",
    "a mountain at sunrise with faceted ridgelines",
    "a sun-dappled forest clearing near a still pond",
    "a quiet desert salt flat with distant dunes",
    "a Buddhist temple lake with stone lanterns",
    "a modern city rooftop with a stylized skyline",
    "a candle-lit cave pool with soft reflections",
    "a cosmic horizon with subtle nebula shapes",
    "an underwater realm with soft caustics",
    "a flowering garden pond with lotus leaves",
];

/// Changes every 100 days; sized exactly for the ten hundred-day buckets.
pub const CLOTHES: [&str; 10] = [
    "an orange robe",
    "white yogic garments with a green sash",
    "a crimson ceremonial cloak",
    "golden spiritual attire",
    "a modern minimalist outfit",
    "a monochrome robe of radiant light",
    "simple mystical armor (clean, non-aggressive shapes)",
    "an Indian dhoti and sash",
    "a futuristic meditation suit",
    "a transparent light body rendered as clean monochrome contours",
];

pub const ATMOSPHERES: [&str; 5] = [
    "soft golden morning light with a subtle haze",
    "gentle sunrise glow in a light mist",
    "silvery dawn ambiance with crisp clarity",
    "warm evening radiance through drifting mist",
    "twilight glow with tender colors",
];

pub const TURBAN_STYLES: [&str; 5] = [
    "a neatly wrapped white turban",
    "a saffron turban with an even, layered wrap",
    "a deep indigo turban with a small front knot",
    "a pale gold turban wrapped high and smooth",
    "a snow-white turban with a thin silver band",
];

pub const HAIR_STYLES: [&str; 5] = [
    "long dark hair gathered in a high topknot",
    "shoulder-length hair combed back smoothly",
    "a tight bun at the crown of the head",
    "wavy hair falling evenly past the ears",
    "short, neatly trimmed hair",
];

pub const BEARD_STYLES: [&str; 4] = [
    "a full, well-groomed dark beard",
    "a long flowing gray beard",
    "a short trimmed beard following the jawline",
    "a pointed sage's beard with a clean mustache",
];
