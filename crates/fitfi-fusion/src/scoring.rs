//! Weighted multi-archetype match scoring.
//!
//! Pure and panic-free on purpose: missing tags, missing formality and
//! empty mixtures all degrade to neutral or zero scores. This engine
//! must never be the reason a product listing fails to render.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::archetypes::{preset_by_id, ArchetypePreset};

/// Fixed per-dimension weights. Color matters most for perceived fit.
/// Tunable, but changing them changes every score in the catalog.
pub const WEIGHT_COLOR: f32 = 0.35;
pub const WEIGHT_MATERIAL: f32 = 0.25;
pub const WEIGHT_SILHOUETTE: f32 = 0.25;
pub const WEIGHT_FORMALITY: f32 = 0.15;

/// Formality score above which the formality signal fires. Strictly
/// higher than the 0.5 neutral default, so a product without a
/// formality value never produces a formality signal.
pub const FORMALITY_SIGNAL_THRESHOLD: f32 = 0.6;

const NEUTRAL_FORMALITY_SCORE: f32 = 0.5;

pub const SIGNAL_COLOR: &str = "kleur-match";
pub const SIGNAL_MATERIAL: &str = "materiaal-match";
pub const SIGNAL_SILHOUETTE: &str = "silhouet-match";
pub const SIGNAL_FORMALITY: &str = "formaliteit-match";

/// The scoring-relevant attributes of a catalog item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductProfile {
    #[serde(default)]
    pub color_tags: Vec<String>,
    #[serde(default)]
    pub material_tags: Vec<String>,
    #[serde(default)]
    pub silhouette_tags: Vec<String>,
    /// 0..100, same scale as the archetype presets.
    #[serde(default)]
    pub formality: Option<f32>,
}

/// Match of one product against one archetype.
#[derive(Debug, Clone)]
pub struct ArchetypeMatch {
    /// Always in [0, 1].
    pub score: f32,
    pub signals: Vec<&'static str>,
}

/// Blended match of one product against a mixed style preference.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FusionScoreDetail {
    /// Always in [0, 1]. Equals the sum of `by_archetype` values.
    pub total_score: f32,
    pub by_archetype: HashMap<String, f32>,
    /// `"{label}: {signal}"` strings, deduplicated, first occurrence
    /// order.
    pub matched_signals: Vec<String>,
}

fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Fraction of the archetype's reference tags present in the product's
/// tag list. A product with no tags for a dimension scores 0, not an
/// error.
fn dimension_score(reference: &[&str], product_tags: &[String]) -> f32 {
    let hits = reference
        .iter()
        .filter(|needle| {
            product_tags
                .iter()
                .any(|tag| tag.trim().eq_ignore_ascii_case(needle))
        })
        .count();
    hits as f32 / reference.len().max(1) as f32
}

/// Linear decay with formality distance, floored at 0 for arbitrarily
/// large distances. Missing product formality scores a neutral 0.5.
fn formality_score(product: &ProductProfile, preset: &ArchetypePreset) -> f32 {
    match product.formality {
        Some(formality) => 1.0 - clamp01((formality - preset.formality).abs() / 100.0),
        None => NEUTRAL_FORMALITY_SCORE,
    }
}

pub fn score_against_archetype(
    product: &ProductProfile,
    preset: &ArchetypePreset,
) -> ArchetypeMatch {
    let color = dimension_score(preset.palette_hints, &product.color_tags);
    let material = dimension_score(preset.materials, &product.material_tags);
    let silhouette = dimension_score(preset.silhouettes, &product.silhouette_tags);
    let formality = formality_score(product, preset);

    let score = clamp01(
        WEIGHT_COLOR * color
            + WEIGHT_MATERIAL * material
            + WEIGHT_SILHOUETTE * silhouette
            + WEIGHT_FORMALITY * formality,
    );

    let mut signals = Vec::new();
    if color > 0.0 {
        signals.push(SIGNAL_COLOR);
    }
    if material > 0.0 {
        signals.push(SIGNAL_MATERIAL);
    }
    if silhouette > 0.0 {
        signals.push(SIGNAL_SILHOUETTE);
    }
    if formality > FORMALITY_SIGNAL_THRESHOLD {
        signals.push(SIGNAL_FORMALITY);
    }

    ArchetypeMatch { score, signals }
}

/// Drop non-positive entries and scale the rest to sum to 1. An input
/// with no positive weights normalizes to an empty map, which callers
/// treat as "no preference".
pub fn normalize_weights(weights: &HashMap<String, f32>) -> HashMap<String, f32> {
    let positive: Vec<(&String, f32)> = weights
        .iter()
        .filter(|(_, weight)| weight.is_finite() && **weight > 0.0)
        .map(|(id, weight)| (id, *weight))
        .collect();

    let sum: f32 = positive.iter().map(|(_, weight)| weight).sum();
    if sum <= 0.0 {
        return HashMap::new();
    }

    positive
        .into_iter()
        .map(|(id, weight)| (id.clone(), weight / sum))
        .collect()
}

/// Blend per-archetype scores according to a (raw) weight mixture.
pub fn fusion_score(
    product: &ProductProfile,
    weights: &HashMap<String, f32>,
) -> FusionScoreDetail {
    let normalized = normalize_weights(weights);
    if normalized.is_empty() {
        return FusionScoreDetail::default();
    }

    // Stable iteration so signal order does not depend on map hashing.
    let mut entries: Vec<(&String, f32)> = normalized
        .iter()
        .map(|(id, weight)| (id, *weight))
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(b.0)));

    let mut total = 0.0f32;
    let mut by_archetype = HashMap::new();
    let mut matched_signals = Vec::new();
    let mut seen = HashSet::new();

    for (archetype_id, weight) in entries {
        let Some(preset) = preset_by_id(archetype_id) else {
            tracing::warn!(archetype = %archetype_id, "unknown archetype in mixture, skipping");
            continue;
        };

        let matched = score_against_archetype(product, preset);
        let contribution = weight * matched.score;
        total += contribution;
        by_archetype.insert(archetype_id.clone(), contribution);

        for signal in matched.signals {
            let labeled = format!("{}: {}", preset.label, signal);
            if seen.insert(labeled.clone()) {
                matched_signals.push(labeled);
            }
        }
    }

    FusionScoreDetail {
        total_score: clamp01(total),
        by_archetype,
        matched_signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(colors: &[&str], materials: &[&str], silhouettes: &[&str], formality: Option<f32>) -> ProductProfile {
        ProductProfile {
            color_tags: colors.iter().map(|s| s.to_string()).collect(),
            material_tags: materials.iter().map(|s| s.to_string()).collect(),
            silhouette_tags: silhouettes.iter().map(|s| s.to_string()).collect(),
            formality,
        }
    }

    fn weights(pairs: &[(&str, f32)]) -> HashMap<String, f32> {
        pairs
            .iter()
            .map(|(id, weight)| (id.to_string(), *weight))
            .collect()
    }

    #[test]
    fn normalize_drops_non_positive_and_sums_to_one() {
        let normalized = normalize_weights(&weights(&[("a", 2.0), ("b", 2.0), ("c", 0.0)]));
        assert_eq!(normalized.len(), 2);
        assert!((normalized["a"] - 0.5).abs() < 1e-6);
        assert!((normalized["b"] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn normalize_empty_and_all_zero_yield_empty() {
        assert!(normalize_weights(&HashMap::new()).is_empty());
        assert!(normalize_weights(&weights(&[("a", 0.0), ("b", -1.0)])).is_empty());
    }

    #[test]
    fn normalize_ignores_nan() {
        let normalized = normalize_weights(&weights(&[("a", f32::NAN), ("b", 1.0)]));
        assert_eq!(normalized.len(), 1);
        assert!((normalized["b"] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn perfect_match_scores_one() {
        let preset = preset_by_id("klassiek").unwrap();
        let product = profile(
            &["navy", "wit", "camel", "grijs"],
            &["wol", "katoen", "zijde"],
            &["getailleerd", "recht"],
            Some(75.0),
        );
        let matched = score_against_archetype(&product, preset);
        assert!((matched.score - 1.0).abs() < 1e-6);
        assert_eq!(
            matched.signals,
            vec![SIGNAL_COLOR, SIGNAL_MATERIAL, SIGNAL_SILHOUETTE, SIGNAL_FORMALITY]
        );
    }

    #[test]
    fn untagged_product_scores_neutral_formality_only() {
        let preset = preset_by_id("urban").unwrap();
        let matched = score_against_archetype(&ProductProfile::default(), preset);
        // 0.15 * 0.5 from the neutral formality default, nothing else.
        assert!((matched.score - 0.075).abs() < 1e-6);
        assert!(matched.signals.is_empty());
    }

    #[test]
    fn score_is_clamped_for_pathological_formality() {
        let preset = preset_by_id("klassiek").unwrap();
        let product = profile(&[], &[], &[], Some(10_000.0));
        let matched = score_against_archetype(&product, preset);
        assert!((0.0..=1.0).contains(&matched.score));
        // Distance far beyond 100 floors the formality term at 0.
        assert!((matched.score - 0.0).abs() < 1e-6);
    }

    #[test]
    fn partial_color_match_is_fraction_of_reference_set() {
        let preset = preset_by_id("klassiek").unwrap();
        // 2 of 4 palette hints present.
        let product = profile(&["navy", "camel", "roze"], &[], &[], None);
        let matched = score_against_archetype(&product, preset);
        let expected = WEIGHT_COLOR * 0.5 + WEIGHT_FORMALITY * 0.5;
        assert!((matched.score - expected).abs() < 1e-6);
        assert_eq!(matched.signals, vec![SIGNAL_COLOR]);
    }

    #[test]
    fn tag_matching_ignores_case_and_whitespace() {
        let preset = preset_by_id("urban").unwrap();
        let product = profile(&[" Zwart ", "GRIJS"], &[], &[], None);
        let matched = score_against_archetype(&product, preset);
        assert!(matched.signals.contains(&SIGNAL_COLOR));
    }

    #[test]
    fn neutral_formality_does_not_signal() {
        let preset = preset_by_id("klassiek").unwrap();
        let matched = score_against_archetype(&profile(&["navy"], &[], &[], None), preset);
        assert!(!matched.signals.contains(&SIGNAL_FORMALITY));
    }

    #[test]
    fn fusion_is_additive_over_equal_weights() {
        let product = profile(&["zwart", "wit"], &["jersey"], &["oversized"], Some(30.0));
        let mixture = weights(&[("urban", 1.0), ("streetstyle", 1.0)]);

        let urban = score_against_archetype(&product, preset_by_id("urban").unwrap());
        let street = score_against_archetype(&product, preset_by_id("streetstyle").unwrap());
        let detail = fusion_score(&product, &mixture);

        let expected = 0.5 * urban.score + 0.5 * street.score;
        assert!((detail.total_score - expected).abs() < 1e-5);
        let recomposed = detail.by_archetype["urban"] + detail.by_archetype["streetstyle"];
        assert!((recomposed - detail.total_score).abs() < 1e-5);
    }

    #[test]
    fn fusion_empty_mixture_yields_zero_detail() {
        let detail = fusion_score(&ProductProfile::default(), &HashMap::new());
        assert_eq!(detail.total_score, 0.0);
        assert!(detail.by_archetype.is_empty());
        assert!(detail.matched_signals.is_empty());
    }

    #[test]
    fn fusion_skips_unknown_archetypes() {
        let product = profile(&["zwart"], &[], &[], None);
        let detail = fusion_score(&product, &weights(&[("urban", 1.0), ("cyberpunk", 1.0)]));
        assert!(detail.by_archetype.contains_key("urban"));
        assert!(!detail.by_archetype.contains_key("cyberpunk"));
        // Unknown half of the mixture contributes nothing, so the total
        // is the urban contribution alone.
        assert!((detail.total_score - detail.by_archetype["urban"]).abs() < 1e-6);
    }

    #[test]
    fn fusion_signals_are_labeled_and_deduplicated() {
        // Both archetypes share the "zwart" palette hint, so both emit
        // a color signal; labels differ so both survive dedup.
        let product = profile(&["zwart"], &[], &[], None);
        let detail = fusion_score(&product, &weights(&[("urban", 1.0), ("streetstyle", 1.0)]));
        assert!(detail
            .matched_signals
            .contains(&"Urban: kleur-match".to_string()));
        assert!(detail
            .matched_signals
            .contains(&"Streetstyle: kleur-match".to_string()));

        // Same archetype twice in a map is impossible, but the same
        // label+signal pair from repeated scoring must collapse.
        let single = fusion_score(&product, &weights(&[("urban", 2.0)]));
        let count = single
            .matched_signals
            .iter()
            .filter(|s| s.as_str() == "Urban: kleur-match")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn fusion_signal_order_follows_descending_weight() {
        let product = profile(&["zwart"], &[], &[], None);
        let detail = fusion_score(&product, &weights(&[("urban", 1.0), ("streetstyle", 3.0)]));
        assert_eq!(detail.matched_signals[0], "Streetstyle: kleur-match");
    }

    #[test]
    fn product_profile_decodes_leniently_from_json() {
        let profile: ProductProfile =
            serde_json::from_str(r#"{"color_tags":["navy"],"formality":70}"#).unwrap();
        assert_eq!(profile.color_tags, vec!["navy"]);
        assert_eq!(profile.formality, Some(70.0));
        assert!(profile.material_tags.is_empty());
        assert!(profile.silhouette_tags.is_empty());
    }

    #[test]
    fn fusion_detail_serializes_for_api_consumers() {
        let product = profile(&["navy"], &[], &[], None);
        let detail = fusion_score(&product, &weights(&[("klassiek", 1.0)]));
        let json = serde_json::to_value(&detail).unwrap();
        assert!(json["total_score"].is_number());
        assert!(json["by_archetype"]["klassiek"].is_number());
        assert_eq!(json["matched_signals"][0], "Klassiek: kleur-match");
    }

    #[test]
    fn dimension_weights_sum_to_one() {
        let sum = WEIGHT_COLOR + WEIGHT_MATERIAL + WEIGHT_SILHOUETTE + WEIGHT_FORMALITY;
        assert!((sum - 1.0).abs() < 1e-6);
    }
}
