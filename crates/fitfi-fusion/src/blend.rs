use std::collections::HashMap;

use crate::archetypes::preset_by_id;
use crate::scoring::normalize_weights;

/// Human-readable rendering of a normalized mixture, descending by
/// weight: `"75% Klassiek + 25% Urban"`.
///
/// Percentages round independently and may not sum to exactly 100;
/// that is accepted, no residue redistribution. Equal weights break
/// ties on archetype id so output is deterministic. Unknown archetype
/// ids fall back to their raw id as the label.
pub fn format_blend_string(weights: &HashMap<String, f32>) -> String {
    let normalized = normalize_weights(weights);

    let mut entries: Vec<(&String, f32)> = normalized
        .iter()
        .map(|(id, weight)| (id, *weight))
        .collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(b.0))
    });

    entries
        .into_iter()
        .map(|(id, weight)| {
            let label = preset_by_id(id)
                .map(|preset| preset.label)
                .unwrap_or(id.as_str());
            format!("{}% {}", (weight * 100.0).round() as i64, label)
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(pairs: &[(&str, f32)]) -> HashMap<String, f32> {
        pairs
            .iter()
            .map(|(id, weight)| (id.to_string(), *weight))
            .collect()
    }

    #[test]
    fn blend_formats_descending_by_weight() {
        let blend = format_blend_string(&weights(&[("klassiek", 3.0), ("urban", 1.0)]));
        assert_eq!(blend, "75% Klassiek + 25% Urban");
    }

    #[test]
    fn blend_of_empty_mixture_is_empty() {
        assert_eq!(format_blend_string(&HashMap::new()), "");
        assert_eq!(format_blend_string(&weights(&[("urban", 0.0)])), "");
    }

    #[test]
    fn blend_single_archetype_is_hundred_percent() {
        assert_eq!(format_blend_string(&weights(&[("retro", 0.4)])), "100% Retro");
    }

    #[test]
    fn blend_rounding_residue_is_accepted() {
        let blend = format_blend_string(&weights(&[
            ("klassiek", 1.0),
            ("urban", 1.0),
            ("retro", 1.0),
        ]));
        // 33 + 33 + 33 != 100, by design.
        assert_eq!(blend, "33% Klassiek + 33% Retro + 33% Urban");
    }

    #[test]
    fn blend_ties_break_on_id() {
        let blend = format_blend_string(&weights(&[("urban", 1.0), ("klassiek", 1.0)]));
        assert_eq!(blend, "50% Klassiek + 50% Urban");
    }

    #[test]
    fn blend_unknown_id_uses_raw_id() {
        let blend = format_blend_string(&weights(&[("vintage", 1.0)]));
        assert_eq!(blend, "100% vintage");
    }
}
