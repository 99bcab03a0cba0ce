use serde::Serialize;

/// A style archetype with its fixed reference attributes.
///
/// Configuration data, not derived: the tag sets and formality level
/// describe what the archetype looks like on a rack, and scoring
/// measures how much of that shows up in a product.
#[derive(Debug, Clone, Serialize)]
pub struct ArchetypePreset {
    pub id: &'static str,
    pub label: &'static str,
    pub palette_hints: &'static [&'static str],
    pub materials: &'static [&'static str],
    pub silhouettes: &'static [&'static str],
    /// 0 (strandfeest) .. 100 (black tie)
    pub formality: f32,
}

pub const ARCHETYPE_PRESETS: &[ArchetypePreset] = &[
    ArchetypePreset {
        id: "klassiek",
        label: "Klassiek",
        palette_hints: &["navy", "wit", "camel", "grijs"],
        materials: &["wol", "katoen", "zijde"],
        silhouettes: &["getailleerd", "recht"],
        formality: 75.0,
    },
    ArchetypePreset {
        id: "casual_chic",
        label: "Casual Chic",
        palette_hints: &["beige", "ecru", "lichtblauw", "taupe"],
        materials: &["linnen", "katoen", "denim"],
        silhouettes: &["relaxed", "getailleerd"],
        formality: 55.0,
    },
    ArchetypePreset {
        id: "urban",
        label: "Urban",
        palette_hints: &["zwart", "grijs", "olijf"],
        materials: &["denim", "jersey", "nylon"],
        silhouettes: &["oversized", "recht"],
        formality: 35.0,
    },
    ArchetypePreset {
        id: "streetstyle",
        label: "Streetstyle",
        palette_hints: &["zwart", "wit", "neon", "rood"],
        materials: &["jersey", "fleece", "nylon"],
        silhouettes: &["oversized", "boxy"],
        formality: 20.0,
    },
    ArchetypePreset {
        id: "retro",
        label: "Retro",
        palette_hints: &["mosterd", "bruin", "oranje", "creme"],
        materials: &["corduroy", "suede", "wol"],
        silhouettes: &["flared", "a-lijn"],
        formality: 45.0,
    },
    ArchetypePreset {
        id: "luxury",
        label: "Luxury",
        palette_hints: &["zwart", "champagne", "bordeaux"],
        materials: &["zijde", "kasjmier", "leer"],
        silhouettes: &["getailleerd", "vloeiend"],
        formality: 85.0,
    },
];

/// Look up an archetype preset by id.
pub fn preset_by_id(id: &str) -> Option<&'static ArchetypePreset> {
    ARCHETYPE_PRESETS.iter().find(|preset| preset.id == id)
}

/// All known archetype ids, for config validation and CLI help.
pub fn archetype_ids() -> Vec<&'static str> {
    ARCHETYPE_PRESETS.iter().map(|preset| preset.id).collect()
}
