use crate::error::Result;
use crate::prompt::calendar::check_index;
use crate::prompt::params::View;
use crate::prompt::tables::{BEARD_STYLES, HAIR_STYLES, TURBAN_STYLES};

/// Head and facial-hair depiction for one day. Turban wins over hair; beard
/// only ever shows on the front view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appearance {
    pub beard: bool,
    pub turban: bool,
    pub hair: bool,
    pub bald: bool,
}

impl Appearance {
    pub fn resolve(index: i64, view: View) -> Result<Self> {
        check_index(index)?;
        let beard = index % 2 == 0 && view == View::Front;
        let turban = index % 3 == 0;
        let hair = index % 4 == 0 && !turban;
        let bald = !turban && !hair;
        Ok(Appearance {
            beard,
            turban,
            hair,
            bald,
        })
    }
}

/// One descriptive sentence covering headwear/hair and, when present, beard.
pub fn appearance_line(index: i64, view: View) -> Result<String> {
    let features = Appearance::resolve(index, view)?;
    let n = index as usize;

    let head = if features.turban {
        format!(
            "Headwear: {}.",
            TURBAN_STYLES[(n / 3) % TURBAN_STYLES.len()]
        )
    } else if features.hair {
        format!("Hair: {}.", HAIR_STYLES[(n / 4) % HAIR_STYLES.len()])
    } else {
        "Head: smoothly shaved, bald.".to_string()
    };

    if features.beard {
        Ok(format!(
            "{head} Facial hair: {}.",
            BEARD_STYLES[(n / 2) % BEARD_STYLES.len()]
        ))
    } else {
        Ok(head)
    }
}

/// Exclusion sentences keeping the renderer consistent with the resolved
/// appearance flags.
pub fn appearance_negatives(index: i64, view: View) -> Result<Vec<String>> {
    let features = Appearance::resolve(index, view)?;
    let mut negatives = Vec::new();

    if features.turban {
        negatives.push("Do not show head hair outside the turban.".to_string());
    }
    if features.bald {
        negatives.push("Do not add head hair.".to_string());
        negatives.push("Do not add any headwear.".to_string());
    }
    if features.hair {
        negatives.push("Do not add any headwear.".to_string());
    }
    if !features.beard {
        negatives.push("Do not add a beard.".to_string());
    }

    Ok(negatives)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_the_divisibility_rules() {
        for n in 1..=120 {
            for view in [View::Front, View::Back] {
                let a = Appearance::resolve(n, view).unwrap();
                assert_eq!(a.beard, n % 2 == 0 && view == View::Front, "beard day {n}");
                assert_eq!(a.turban, n % 3 == 0, "turban day {n}");
                assert_eq!(a.hair, n % 4 == 0 && n % 3 != 0, "hair day {n}");
            }
        }
    }

    #[test]
    fn exactly_one_of_turban_hair_bald_holds() {
        for n in 1..=120 {
            let a = Appearance::resolve(n, View::Front).unwrap();
            let count = [a.turban, a.hair, a.bald].iter().filter(|f| **f).count();
            assert_eq!(count, 1, "day {n}: {a:?}");
        }
    }

    #[test]
    fn beard_never_shows_on_the_back_view() {
        for n in 1..=50 {
            assert!(!Appearance::resolve(n, View::Back).unwrap().beard);
        }
    }

    #[test]
    fn negatives_never_contradict_the_beard_flag() {
        for n in 1..=120 {
            for view in [View::Front, View::Back] {
                let beard = Appearance::resolve(n, view).unwrap().beard;
                let negatives = appearance_negatives(n, view).unwrap();
                let has_beard_exclusion = negatives.iter().any(|s| s.contains("beard"));
                assert_eq!(has_beard_exclusion, !beard, "day {n} view {view:?}");
            }
        }
    }

    #[test]
    fn day_twelve_front_wears_turban_and_beard() {
        // 12 % 3 == 0 forces the turban, suppressing hair; 12 is even so the
        // front view keeps the beard.
        let a = Appearance::resolve(12, View::Front).unwrap();
        assert!(a.turban && a.beard && !a.hair && !a.bald);

        let line = appearance_line(12, View::Front).unwrap();
        assert!(line.contains("turban"), "{line}");
        assert!(line.contains("Facial hair"), "{line}");

        let negatives = appearance_negatives(12, View::Front).unwrap();
        assert!(negatives
            .iter()
            .any(|s| s == "Do not show head hair outside the turban."));
        assert!(!negatives.iter().any(|s| s.contains("beard")));
    }

    #[test]
    fn resolve_rejects_out_of_range_indices() {
        assert!(Appearance::resolve(0, View::Front).is_err());
        assert!(appearance_line(1001, View::Back).is_err());
        assert!(appearance_negatives(-5, View::Front).is_err());
    }
}
