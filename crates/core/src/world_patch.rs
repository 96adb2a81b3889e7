//! World Patch Model and Builder
//!
//! A `WorldPatch` is the canonical description of one visual mutation of the
//! game world. The agent's `apply_world_patch` tool produces it from whatever
//! parameters the model chose, so every field here is defaulted or clamped
//! instead of rejected.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_EFFECT: Effect = Effect::Neon;
pub const DEFAULT_COLOR: &str = "#66AAEE";
pub const DEFAULT_INTENSITY: u8 = 70;
pub const MAX_INTENSITY: i64 = 100;

/// Synonyms the model (or the user) may use for a supported effect.
pub const EFFECT_ALIASES: &[(&str, Effect)] = &[
    ("aurora", Effect::Neon),
    ("storm", Effect::Ripple),
    ("wave", Effect::Ripple),
    ("pulse", Effect::Resonance),
    ("glitch", Effect::Scanline),
    ("キラキラ", Effect::Neon),
    ("波", Effect::Ripple),
    ("共鳴", Effect::Resonance),
    ("走査線", Effect::Scanline),
];

/// The fixed set of effects the client knows how to render.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Ripple,
    Resonance,
    Neon,
    Scanline,
}

impl Effect {
    pub const ALL: [Effect; 4] = [
        Effect::Ripple,
        Effect::Resonance,
        Effect::Neon,
        Effect::Scanline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Ripple => "ripple",
            Effect::Resonance => "resonance",
            Effect::Neon => "neon",
            Effect::Scanline => "scanline",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Effect::ALL
            .into_iter()
            .find(|effect| effect.as_str() == s)
            .ok_or_else(|| format!("unsupported effect '{}'", s))
    }
}

/// An entity to place in the world alongside the effect.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct Spawn {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: i64,
    pub y: i64,
}

/// A fully normalized world mutation, ready to be sent to the client.
///
/// Serializes to exactly the five keys the patch locator looks for; `spawn`
/// is emitted as `null` rather than omitted.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct WorldPatch {
    pub effect: Effect,
    pub color: String,
    pub intensity: u8,
    pub spawn: Option<Spawn>,
    pub caption: String,
}

/// Raw parameters of the `apply_world_patch` tool call.
///
/// Fields that are absent, or of the wrong JSON type, decode to `None`.
#[derive(Deserialize, JsonSchema, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ApplyWorldPatchArgs {
    #[schemars(description = "Visual effect: ripple, resonance, neon or scanline")]
    #[serde(deserialize_with = "lenient_string")]
    pub effect: Option<String>,
    #[schemars(description = "Color in #RRGGBB form")]
    #[serde(deserialize_with = "lenient_string")]
    pub color: Option<String>,
    #[schemars(description = "Effect strength from 0 to 100")]
    #[serde(deserialize_with = "lenient_int")]
    pub intensity: Option<i64>,
    #[schemars(description = "Entity to spawn, or an empty string for none")]
    #[serde(deserialize_with = "lenient_string")]
    pub spawn_type: Option<String>,
    #[schemars(description = "Horizontal spawn position")]
    #[serde(deserialize_with = "lenient_int")]
    pub spawn_x: Option<i64>,
    #[schemars(description = "Vertical spawn position")]
    #[serde(deserialize_with = "lenient_int")]
    pub spawn_y: Option<i64>,
    #[schemars(description = "Short caption describing the change")]
    #[serde(deserialize_with = "lenient_string")]
    pub caption: Option<String>,
}

/// The JSON document the tool hands back to the agent runtime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApplyWorldPatchResult {
    pub status: String,
    pub patch: WorldPatch,
}

impl ApplyWorldPatchResult {
    pub fn applied(patch: WorldPatch) -> Self {
        Self {
            status: "applied".to_string(),
            patch,
        }
    }
}

/// Builds a canonical `WorldPatch` from raw tool parameters. Never fails.
pub fn build_patch(args: &ApplyWorldPatchArgs) -> WorldPatch {
    let effect = normalize_effect(args.effect.as_deref());
    let color = normalize_color(args.color.as_deref());
    let intensity = normalize_intensity(args.intensity);

    let spawn = args
        .spawn_type
        .as_deref()
        .filter(|kind| !kind.is_empty())
        .map(|kind| Spawn {
            kind: kind.to_string(),
            x: args.spawn_x.unwrap_or(0),
            y: args.spawn_y.unwrap_or(0),
        });

    let caption = match args.caption.as_deref().map(str::trim) {
        Some(caption) if !caption.is_empty() => caption.to_string(),
        _ => format!("{} applied", effect),
    };

    WorldPatch {
        effect,
        color,
        intensity,
        spawn,
        caption,
    }
}

pub fn normalize_effect(effect: Option<&str>) -> Effect {
    let raw = effect.unwrap_or_default().trim().to_lowercase();
    if raw.is_empty() {
        return DEFAULT_EFFECT;
    }
    if let Some((_, target)) = EFFECT_ALIASES.iter().find(|(alias, _)| *alias == raw) {
        return *target;
    }
    raw.parse().unwrap_or(DEFAULT_EFFECT)
}

pub fn normalize_color(color: Option<&str>) -> String {
    let raw = color.unwrap_or_default().trim();
    match raw.strip_prefix('#') {
        Some(hex) if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            raw.to_ascii_uppercase()
        }
        _ => DEFAULT_COLOR.to_string(),
    }
}

pub fn normalize_intensity(intensity: Option<i64>) -> u8 {
    match intensity {
        None => DEFAULT_INTENSITY,
        // Clamped into 0..=100, so the narrowing cannot truncate.
        Some(value) => value.clamp(0, MAX_INTENSITY) as u8,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> ApplyWorldPatchArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_build_patch_with_valid_parameters() {
        let patch = build_patch(&args(json!({
            "effect": "ripple",
            "color": "#7b68ee",
            "intensity": 80,
            "spawn_type": "crystal",
            "spawn_x": 12,
            "spawn_y": 34,
            "caption": "オーロラが空を覆う",
        })));

        assert_eq!(patch.effect, Effect::Ripple);
        assert_eq!(patch.color, "#7B68EE");
        assert_eq!(patch.intensity, 80);
        assert_eq!(
            patch.spawn,
            Some(Spawn {
                kind: "crystal".to_string(),
                x: 12,
                y: 34
            })
        );
        assert_eq!(patch.caption, "オーロラが空を覆う");
    }

    #[test]
    fn test_build_patch_with_no_parameters_uses_defaults() {
        let patch = build_patch(&ApplyWorldPatchArgs::default());

        assert_eq!(patch.effect, DEFAULT_EFFECT);
        assert_eq!(patch.color, DEFAULT_COLOR);
        assert_eq!(patch.intensity, DEFAULT_INTENSITY);
        assert_eq!(patch.spawn, None);
        assert_eq!(patch.caption, "neon applied");
    }

    #[test]
    fn test_effect_aliases_resolve_to_their_target() {
        for (alias, target) in EFFECT_ALIASES {
            assert_eq!(normalize_effect(Some(*alias)), *target, "alias {}", alias);
        }
        assert_eq!(normalize_effect(Some("  AURORA ")), Effect::Neon);
        assert_eq!(normalize_effect(Some("Storm")), Effect::Ripple);
    }

    #[test]
    fn test_unknown_or_empty_effect_falls_back_to_default() {
        assert_eq!(normalize_effect(Some("calm")), DEFAULT_EFFECT);
        assert_eq!(normalize_effect(Some("")), DEFAULT_EFFECT);
        assert_eq!(normalize_effect(Some("   ")), DEFAULT_EFFECT);
        assert_eq!(normalize_effect(None), DEFAULT_EFFECT);
        assert_eq!(normalize_effect(Some("SCANLINE")), Effect::Scanline);
    }

    #[test]
    fn test_color_validation() {
        assert_eq!(normalize_color(Some("#00ff99")), "#00FF99");
        assert_eq!(normalize_color(Some("#ABCDEF")), "#ABCDEF");
        assert_eq!(normalize_color(Some(" #abcdef ")), "#ABCDEF");

        for invalid in ["", "red", "00FF99", "#00FF9", "#00FF999", "#GGGGGG", "##00FF9"] {
            assert_eq!(normalize_color(Some(invalid)), DEFAULT_COLOR, "{}", invalid);
        }
        assert_eq!(normalize_color(None), DEFAULT_COLOR);
    }

    #[test]
    fn test_intensity_clamping() {
        assert_eq!(normalize_intensity(None), DEFAULT_INTENSITY);
        assert_eq!(normalize_intensity(Some(-1)), 0);
        assert_eq!(normalize_intensity(Some(i64::MIN)), 0);
        assert_eq!(normalize_intensity(Some(0)), 0);
        assert_eq!(normalize_intensity(Some(55)), 55);
        assert_eq!(normalize_intensity(Some(100)), 100);
        assert_eq!(normalize_intensity(Some(101)), 100);
        assert_eq!(normalize_intensity(Some(i64::MAX)), 100);
    }

    #[test]
    fn test_empty_spawn_type_ignores_coordinates() {
        let patch = build_patch(&args(json!({
            "spawn_type": "",
            "spawn_x": 5,
            "spawn_y": 9,
        })));
        assert_eq!(patch.spawn, None);

        let patch = build_patch(&args(json!({ "spawn_type": "wolf", "spawn_x": -3, "spawn_y": 7 })));
        let spawn = patch.spawn.unwrap();
        assert_eq!(spawn.kind, "wolf");
        assert_eq!((spawn.x, spawn.y), (-3, 7));
    }

    #[test]
    fn test_spawn_type_is_kept_verbatim() {
        let patch = build_patch(&args(json!({ "spawn_type": " wolf ", "spawn_x": 1 })));
        let spawn = patch.spawn.unwrap();
        assert_eq!(spawn.kind, " wolf ");
        assert_eq!((spawn.x, spawn.y), (1, 0));

        let patch = build_patch(&args(json!({ "spawn_type": "   ", "spawn_x": 1, "spawn_y": 2 })));
        assert_eq!(patch.spawn.unwrap().kind, "   ");
    }

    #[test]
    fn test_blank_caption_uses_normalized_effect() {
        let patch = build_patch(&args(json!({ "effect": "glitch", "caption": "   " })));
        assert_eq!(patch.caption, "scanline applied");

        let patch = build_patch(&args(json!({ "caption": "  静寂が訪れる  " })));
        assert_eq!(patch.caption, "静寂が訪れる");
    }

    #[test]
    fn test_lenient_argument_decoding() {
        let decoded = args(json!({
            "effect": 42,
            "color": null,
            "intensity": "85",
            "spawn_type": "robot",
            "spawn_x": 3.9,
            "spawn_y": [1],
            "caption": { "text": "nested" },
        }));

        assert_eq!(decoded.effect, None);
        assert_eq!(decoded.color, None);
        assert_eq!(decoded.intensity, Some(85));
        assert_eq!(decoded.spawn_x, Some(3));
        assert_eq!(decoded.spawn_y, None);
        assert_eq!(decoded.caption, None);

        let patch = build_patch(&decoded);
        assert_eq!(patch.intensity, 85);
        assert_eq!(patch.spawn.unwrap().y, 0);
    }

    #[test]
    fn test_patch_serializes_with_all_five_keys() {
        let json = serde_json::to_value(build_patch(&ApplyWorldPatchArgs::default())).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 5);
        assert_eq!(json["effect"], "neon");
        assert_eq!(json["spawn"], Value::Null);

        let with_spawn = build_patch(&args(json!({ "spawn_type": "tree", "spawn_x": 1, "spawn_y": 2 })));
        let json = serde_json::to_value(with_spawn).unwrap();
        assert_eq!(json["spawn"], json!({ "type": "tree", "x": 1, "y": 2 }));
    }

    #[test]
    fn test_effect_from_str_and_display() {
        for effect in Effect::ALL {
            assert_eq!(effect.to_string().parse::<Effect>(), Ok(effect));
        }
        assert!("aurora".parse::<Effect>().is_err());
    }
}
