// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/keycodes.rs
//!
//! Keyboard semantics for keymap expressions
//!
//! This module is the reference executor used to give each key a meaning:
//! - `Modifier`: The eight left/right Ctrl, Shift, Alt and Win keys
//! - `SemanticResult`: What a key does, plus a hint for keycap rendering
//! - Modifier composition (`LSFT(KC_A)`, `LALT(LSFT(KC_Z))`, `HYPR(...)`)
//! - Mod-tap (`LCTL_T(KC_ESC)`, `MT(MOD_LSFT, KC_A)`)
//! - Layer actions (`LT`, `MO`, `TG`, `OSL`, `TO`, `DF`, `TT`, `OSM`)
//! - Word resolution through alias and symbol tables
//!
//! Semantically invalid input never panics: it produces
//! `SemanticResult::Error` with a diagnostic message.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::core::evaluator::{Executor, Function};

/// Keycode that emits nothing
pub const NO_KEYCODE: &str = "KC_NO";

/// Prefix marking the modifier text of a mod-tap key
pub const MOD_TAP_MARKER: &str = "•";

const LAYER_TAP_GLYPH: &str = "▽";
const MOMENTARY_GLYPH: &str = "▼";
const TOGGLE_GLYPH: &str = "⇄";
const ONE_SHOT_GLYPH: &str = "¹";
const TO_LAYER_GLYPH: &str = "→";
const DEFAULT_LAYER_GLYPH: &str = "⌂";
const TAP_TOGGLE_GLYPH: &str = "⇅";

/// Keyboard modifier keys
///
/// Variant order is the canonical display order: Ctrl, Shift, Alt, Win,
/// with the left-hand key before the right-hand one.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Modifier {
    #[serde(rename = "LCTL")]
    LCtrl,
    #[serde(rename = "RCTL")]
    RCtrl,
    #[serde(rename = "LSFT")]
    LShift,
    #[serde(rename = "RSFT")]
    RShift,
    #[serde(rename = "LALT")]
    LAlt,
    #[serde(rename = "RALT")]
    RAlt,
    #[serde(rename = "LGUI")]
    LGui,
    #[serde(rename = "RGUI")]
    RGui,
}

impl Modifier {
    /// Name of the function that applies this modifier
    pub fn function_name(self) -> &'static str {
        match self {
            Modifier::LCtrl => "LCTL",
            Modifier::RCtrl => "RCTL",
            Modifier::LShift => "LSFT",
            Modifier::RShift => "RSFT",
            Modifier::LAlt => "LALT",
            Modifier::RAlt => "RALT",
            Modifier::LGui => "LGUI",
            Modifier::RGui => "RGUI",
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            Modifier::LCtrl => "Ctrl",
            Modifier::RCtrl => "RCtrl",
            Modifier::LShift => "Shift",
            Modifier::RShift => "RShift",
            Modifier::LAlt => "Alt",
            Modifier::RAlt => "AltGr",
            Modifier::LGui => "Win",
            Modifier::RGui => "RWin",
        }
    }

    /// Three-letter abbreviation
    pub fn abbreviation(self) -> &'static str {
        match self {
            Modifier::LCtrl => "Ctl",
            Modifier::RCtrl => "RCt",
            Modifier::LShift => "Sft",
            Modifier::RShift => "RSf",
            Modifier::LAlt => "Alt",
            Modifier::RAlt => "AGr",
            Modifier::LGui => "Win",
            Modifier::RGui => "RWn",
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Modifier::LCtrl | Modifier::RCtrl => "C",
            Modifier::LShift | Modifier::RShift => "S",
            Modifier::LAlt | Modifier::RAlt => "A",
            Modifier::LGui | Modifier::RGui => "W",
        }
    }

    /// Classifies a modifier keycode such as `KC_LSFT`
    pub fn from_keycode(keycode: &str) -> Option<Modifier> {
        match keycode {
            "KC_LCTL" | "KC_LCTRL" => Some(Modifier::LCtrl),
            "KC_RCTL" | "KC_RCTRL" => Some(Modifier::RCtrl),
            "KC_LSFT" | "KC_LSHIFT" => Some(Modifier::LShift),
            "KC_RSFT" | "KC_RSHIFT" => Some(Modifier::RShift),
            "KC_LALT" | "KC_LOPT" => Some(Modifier::LAlt),
            "KC_RALT" | "KC_ROPT" | "KC_ALGR" => Some(Modifier::RAlt),
            "KC_LGUI" | "KC_LCMD" | "KC_LWIN" => Some(Modifier::LGui),
            "KC_RGUI" | "KC_RCMD" | "KC_RWIN" => Some(Modifier::RGui),
            _ => None,
        }
    }

    /// Parses a mod mask such as `MOD_LCTL | MOD_LSFT`
    pub fn from_mod_mask(mask: &str) -> Option<Vec<Modifier>> {
        let mut mods = Vec::new();
        for part in mask.split('|') {
            match part.trim() {
                "MOD_LCTL" => mods.push(Modifier::LCtrl),
                "MOD_RCTL" => mods.push(Modifier::RCtrl),
                "MOD_LSFT" => mods.push(Modifier::LShift),
                "MOD_RSFT" => mods.push(Modifier::RShift),
                "MOD_LALT" => mods.push(Modifier::LAlt),
                "MOD_RALT" => mods.push(Modifier::RAlt),
                "MOD_LGUI" => mods.push(Modifier::LGui),
                "MOD_RGUI" => mods.push(Modifier::RGui),
                "MOD_MEH" => mods.extend_from_slice(MEH),
                "MOD_HYPR" => mods.extend_from_slice(HYPER),
                _ => return None,
            }
        }
        Some(mods)
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function_name())
    }
}

/// All four standard modifiers
pub const HYPER: &[Modifier] = &[Modifier::LCtrl, Modifier::LShift, Modifier::LAlt, Modifier::LGui];

/// Ctrl, Shift and Alt without Win
pub const MEH: &[Modifier] = &[Modifier::LCtrl, Modifier::LShift, Modifier::LAlt];

/// Modifier functions and the modifiers each applies, in application order
///
/// Every entry also gets a `<NAME>_T` mod-tap variant.
const MODIFIER_FUNCTIONS: &[(&str, &[Modifier])] = &[
    ("LCTL", &[Modifier::LCtrl]),
    ("LSFT", &[Modifier::LShift]),
    ("LALT", &[Modifier::LAlt]),
    ("LGUI", &[Modifier::LGui]),
    ("RCTL", &[Modifier::RCtrl]),
    ("RSFT", &[Modifier::RShift]),
    ("RALT", &[Modifier::RAlt]),
    ("RGUI", &[Modifier::RGui]),
    ("C", &[Modifier::LCtrl]),
    ("S", &[Modifier::LShift]),
    ("A", &[Modifier::LAlt]),
    ("G", &[Modifier::LGui]),
    ("LOPT", &[Modifier::LAlt]),
    ("LCMD", &[Modifier::LGui]),
    ("LWIN", &[Modifier::LGui]),
    ("ROPT", &[Modifier::RAlt]),
    ("ALGR", &[Modifier::RAlt]),
    ("RCMD", &[Modifier::RGui]),
    ("RWIN", &[Modifier::RGui]),
    ("HYPR", HYPER),
    ("MEH", MEH),
    ("LCA", &[Modifier::LCtrl, Modifier::LAlt]),
    ("LSA", &[Modifier::LShift, Modifier::LAlt]),
    ("LCAG", &[Modifier::LCtrl, Modifier::LAlt, Modifier::LGui]),
    ("SGUI", &[Modifier::LShift, Modifier::LGui]),
];

/// Mod-tap names that do not follow the `<NAME>_T` pattern
const TAP_ALIASES: &[(&str, &str)] = &[
    ("CTL_T", "LCTL"),
    ("SFT_T", "LSFT"),
    ("ALT_T", "LALT"),
    ("OPT_T", "LALT"),
    ("GUI_T", "LGUI"),
    ("CMD_T", "LGUI"),
    ("WIN_T", "LGUI"),
    ("ALL_T", "HYPR"),
];

/// Deprecated or alternate spellings and their canonical keycode
const ALIASES: &[(&str, &str)] = &[
    ("_______", "KC_TRNS"),
    ("XXXXXXX", "KC_NO"),
    ("KC_TRANSPARENT", "KC_TRNS"),
    ("KC_LCTRL", "KC_LCTL"),
    ("KC_RCTRL", "KC_RCTL"),
    ("KC_LSHIFT", "KC_LSFT"),
    ("KC_RSHIFT", "KC_RSFT"),
    ("KC_LOPT", "KC_LALT"),
    ("KC_ROPT", "KC_RALT"),
    ("KC_ALGR", "KC_RALT"),
    ("KC_LCMD", "KC_LGUI"),
    ("KC_LWIN", "KC_LGUI"),
    ("KC_RCMD", "KC_RGUI"),
    ("KC_RWIN", "KC_RGUI"),
    ("KC_ESCAPE", "KC_ESC"),
    ("KC_ENTER", "KC_ENT"),
    ("KC_BSPACE", "KC_BSPC"),
    ("KC_BACKSPACE", "KC_BSPC"),
    ("KC_SPACE", "KC_SPC"),
    ("KC_DELETE", "KC_DEL"),
    ("KC_INSERT", "KC_INS"),
    ("KC_PGDOWN", "KC_PGDN"),
    ("KC_CAPSLOCK", "KC_CAPS"),
    ("KC_CAPS_LOCK", "KC_CAPS"),
    ("KC_MINUS", "KC_MINS"),
    ("KC_EQUAL", "KC_EQL"),
    ("KC_LBRACKET", "KC_LBRC"),
    ("KC_LEFT_BRACKET", "KC_LBRC"),
    ("KC_RBRACKET", "KC_RBRC"),
    ("KC_RIGHT_BRACKET", "KC_RBRC"),
    ("KC_BSLASH", "KC_BSLS"),
    ("KC_BACKSLASH", "KC_BSLS"),
    ("KC_SCOLON", "KC_SCLN"),
    ("KC_SEMICOLON", "KC_SCLN"),
    ("KC_QUOTE", "KC_QUOT"),
    ("KC_GRAVE", "KC_GRV"),
    ("KC_COMMA", "KC_COMM"),
    ("KC_SLASH", "KC_SLSH"),
];

/// Friendlier spellings of shifted symbols and their canonical name
const EXPANSION_ALIASES: &[(&str, &str)] = &[
    ("KC_TILDE", "KC_TILD"),
    ("KC_EXCLAIM", "KC_EXLM"),
    ("KC_DOLLAR", "KC_DLR"),
    ("KC_PERCENT", "KC_PERC"),
    ("KC_CIRCUMFLEX", "KC_CIRC"),
    ("KC_AMPERSAND", "KC_AMPR"),
    ("KC_ASTERISK", "KC_ASTR"),
    ("KC_LEFT_PAREN", "KC_LPRN"),
    ("KC_RIGHT_PAREN", "KC_RPRN"),
    ("KC_UNDERSCORE", "KC_UNDS"),
    ("KC_LEFT_CURLY_BRACE", "KC_LCBR"),
    ("KC_RIGHT_CURLY_BRACE", "KC_RCBR"),
    ("KC_COLON", "KC_COLN"),
    ("KC_DOUBLE_QUOTE", "KC_DQUO"),
    ("KC_DQT", "KC_DQUO"),
    ("KC_LEFT_ANGLE_BRACKET", "KC_LABK"),
    ("KC_LT", "KC_LABK"),
    ("KC_RIGHT_ANGLE_BRACKET", "KC_RABK"),
    ("KC_GT", "KC_RABK"),
    ("KC_QUESTION", "KC_QUES"),
];

/// Symbols produced by shifting another keycode
const SHIFTED_SYMBOLS: &[(&str, &str)] = &[
    ("KC_TILD", "KC_GRV"),
    ("KC_EXLM", "KC_1"),
    ("KC_AT", "KC_2"),
    ("KC_HASH", "KC_3"),
    ("KC_DLR", "KC_4"),
    ("KC_PERC", "KC_5"),
    ("KC_CIRC", "KC_6"),
    ("KC_AMPR", "KC_7"),
    ("KC_ASTR", "KC_8"),
    ("KC_LPRN", "KC_9"),
    ("KC_RPRN", "KC_0"),
    ("KC_UNDS", "KC_MINS"),
    ("KC_PLUS", "KC_EQL"),
    ("KC_LCBR", "KC_LBRC"),
    ("KC_RCBR", "KC_RBRC"),
    ("KC_PIPE", "KC_BSLS"),
    ("KC_COLN", "KC_SCLN"),
    ("KC_DQUO", "KC_QUOT"),
    ("KC_LABK", "KC_COMM"),
    ("KC_RABK", "KC_DOT"),
    ("KC_QUES", "KC_SLSH"),
];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Which parts of a keycap should show which text
///
/// Consumed as-is by renderers.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rendered {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom_center: Option<String>,
}

impl Rendered {
    pub fn center(text: impl Into<String>) -> Self {
        Self {
            center: Some(text.into()),
            bottom_center: None,
        }
    }

    pub fn split(center: impl Into<String>, bottom_center: impl Into<String>) -> Self {
        Self {
            center: Some(center.into()),
            bottom_center: Some(bottom_center.into()),
        }
    }
}

/// A keycode combined with one or more modifiers
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ModifierResult {
    pub keycode: String,
    /// In application order, innermost first
    pub mods: Vec<Modifier>,
    pub text: String,
    pub rendered: Rendered,
}

impl ModifierResult {
    pub fn new(keycode: String, mods: Vec<Modifier>) -> Self {
        let text = match mods.as_slice() {
            [single] if keycode == NO_KEYCODE => single.long_name().to_string(),
            _ => short_text(&mods),
        };
        let rendered = if keycode == NO_KEYCODE {
            Rendered::center(text.clone())
        } else {
            Rendered::split(key_label(&keycode), text.clone())
        };

        Self {
            keycode,
            mods,
            text,
            rendered,
        }
    }
}

/// Meaning of a key
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum SemanticResult {
    /// Unrecognised or plain keycode, rendered literally
    Keycode(String),
    Modifier(ModifierResult),
    /// Modifier when held, keycode when tapped
    ModTap(ModifierResult),
    LayerTap {
        layer: String,
        keycode: String,
        rendered: Rendered,
    },
    MomentaryLayer { layer: String, rendered: Rendered },
    ToggleLayer { layer: String, rendered: Rendered },
    OneShotLayer { layer: String, rendered: Rendered },
    ToLayer { layer: String, rendered: Rendered },
    DefaultLayer { layer: String, rendered: Rendered },
    TapToggleLayer { layer: String, rendered: Rendered },
    OneShotModifier { mods: Vec<Modifier>, rendered: Rendered },
    Error { message: String },
}

impl SemanticResult {
    pub fn error(message: impl Into<String>) -> Self {
        SemanticResult::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SemanticResult::Error { .. })
    }

    /// Rendering hint, if this result carries one
    pub fn rendered(&self) -> Option<&Rendered> {
        match self {
            SemanticResult::Modifier(r) | SemanticResult::ModTap(r) => Some(&r.rendered),
            SemanticResult::LayerTap { rendered, .. }
            | SemanticResult::MomentaryLayer { rendered, .. }
            | SemanticResult::ToggleLayer { rendered, .. }
            | SemanticResult::OneShotLayer { rendered, .. }
            | SemanticResult::ToLayer { rendered, .. }
            | SemanticResult::DefaultLayer { rendered, .. }
            | SemanticResult::TapToggleLayer { rendered, .. }
            | SemanticResult::OneShotModifier { rendered, .. } => Some(rendered),
            SemanticResult::Keycode(_) | SemanticResult::Error { .. } => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SemanticResult::Keycode(_) => "keycode",
            SemanticResult::Modifier(_) => "modifier result",
            SemanticResult::ModTap(_) => "mod-tap",
            SemanticResult::LayerTap { .. } => "layer-tap",
            SemanticResult::MomentaryLayer { .. } => "momentary layer",
            SemanticResult::ToggleLayer { .. } => "toggle layer",
            SemanticResult::OneShotLayer { .. } => "one-shot layer",
            SemanticResult::ToLayer { .. } => "to-layer",
            SemanticResult::DefaultLayer { .. } => "default layer",
            SemanticResult::TapToggleLayer { .. } => "tap-toggle layer",
            SemanticResult::OneShotModifier { .. } => "one-shot modifier",
            SemanticResult::Error { .. } => "error",
        }
    }
}

/// Keycap label for a keycode (`KC_ESC` → `ESC`)
pub fn key_label(keycode: &str) -> String {
    keycode.strip_prefix("KC_").unwrap_or(keycode).to_string()
}

/// Joins modifiers in canonical order
///
/// Up to two modifiers use three-letter abbreviations (`Sft+Alt`); more use
/// single letters (`C+S+A`).
pub fn short_text(mods: &[Modifier]) -> String {
    let mut sorted = mods.to_vec();
    sorted.sort();

    sorted
        .iter()
        .map(|m| {
            if mods.len() > 2 {
                m.letter()
            } else {
                m.abbreviation()
            }
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Apply one modifier to a keycode or an existing modifier result
///
/// Applying a modifier to a modifier keycode (`LALT(KC_LSFT)`) combines
/// both on `KC_NO`. Nested applications accumulate in `mods`.
pub fn apply_modifier(value: SemanticResult, modifier: Modifier) -> SemanticResult {
    match value {
        SemanticResult::Keycode(keycode) => {
            let result = match Modifier::from_keycode(&keycode) {
                Some(inner) => ModifierResult::new(NO_KEYCODE.to_string(), vec![inner, modifier]),
                None => ModifierResult::new(keycode, vec![modifier]),
            };
            SemanticResult::Modifier(result)
        }
        SemanticResult::Modifier(ModifierResult {
            keycode, mut mods, ..
        }) => {
            mods.push(modifier);
            SemanticResult::Modifier(ModifierResult::new(keycode, mods))
        }
        SemanticResult::Error { .. } => value,
        other => SemanticResult::error(format!(
            "{} cannot be applied to a {}",
            modifier,
            other.kind()
        )),
    }
}

/// Apply several modifiers in order
pub fn apply_modifiers(value: SemanticResult, mods: &[Modifier]) -> SemanticResult {
    mods.iter().fold(value, |acc, m| apply_modifier(acc, *m))
}

/// Turn a modifier result into a hold-for-modifier, tap-for-key result
///
/// A mod-tap on `KC_NO` has nothing to tap and stays a plain modifier.
pub fn mod_tap(value: SemanticResult) -> SemanticResult {
    match value {
        SemanticResult::Modifier(result) if result.keycode == NO_KEYCODE => {
            SemanticResult::Modifier(result)
        }
        SemanticResult::Modifier(result) => {
            let text = format!("{}{}", MOD_TAP_MARKER, short_text(&result.mods));
            SemanticResult::ModTap(ModifierResult {
                rendered: Rendered::split(key_label(&result.keycode), text.clone()),
                text,
                ..result
            })
        }
        SemanticResult::Error { .. } => value,
        other => SemanticResult::error(format!("mod-tap needs a modifier result, got a {}", other.kind())),
    }
}

fn layer_name(value: SemanticResult, action: &str) -> Result<String, SemanticResult> {
    match value {
        SemanticResult::Keycode(layer) => Ok(layer),
        SemanticResult::Error { .. } => Err(value),
        other => Err(SemanticResult::error(format!(
            "{} needs a layer name, got a {}",
            action,
            other.kind()
        ))),
    }
}

fn layer_hint(glyph: &str, layer: &str) -> Rendered {
    Rendered::center(format!("{}{}", glyph, layer))
}

/// `LT(layer, kc)`: layer while held, keycode when tapped
pub fn layer_tap(layer: SemanticResult, keycode: SemanticResult) -> SemanticResult {
    let layer = match layer_name(layer, "LT") {
        Ok(layer) => layer,
        Err(e) => return e,
    };
    match keycode {
        SemanticResult::Keycode(keycode) => SemanticResult::LayerTap {
            rendered: Rendered::split(key_label(&keycode), format!("{}{}", LAYER_TAP_GLYPH, layer)),
            layer,
            keycode,
        },
        SemanticResult::Error { .. } => keycode,
        other => SemanticResult::error(format!("LT needs a plain keycode, got a {}", other.kind())),
    }
}

/// `MO(layer)`
pub fn momentary_layer(layer: SemanticResult) -> SemanticResult {
    match layer_name(layer, "MO") {
        Ok(layer) => SemanticResult::MomentaryLayer {
            rendered: layer_hint(MOMENTARY_GLYPH, &layer),
            layer,
        },
        Err(e) => e,
    }
}

/// `TG(layer)`
pub fn toggle_layer(layer: SemanticResult) -> SemanticResult {
    match layer_name(layer, "TG") {
        Ok(layer) => SemanticResult::ToggleLayer {
            rendered: layer_hint(TOGGLE_GLYPH, &layer),
            layer,
        },
        Err(e) => e,
    }
}

/// `OSL(layer)`
pub fn one_shot_layer(layer: SemanticResult) -> SemanticResult {
    match layer_name(layer, "OSL") {
        Ok(layer) => SemanticResult::OneShotLayer {
            rendered: layer_hint(ONE_SHOT_GLYPH, &layer),
            layer,
        },
        Err(e) => e,
    }
}

/// `TO(layer)`
pub fn to_layer(layer: SemanticResult) -> SemanticResult {
    match layer_name(layer, "TO") {
        Ok(layer) => SemanticResult::ToLayer {
            rendered: layer_hint(TO_LAYER_GLYPH, &layer),
            layer,
        },
        Err(e) => e,
    }
}

/// `DF(layer)`
pub fn default_layer(layer: SemanticResult) -> SemanticResult {
    match layer_name(layer, "DF") {
        Ok(layer) => SemanticResult::DefaultLayer {
            rendered: layer_hint(DEFAULT_LAYER_GLYPH, &layer),
            layer,
        },
        Err(e) => e,
    }
}

/// `TT(layer)`
pub fn tap_toggle_layer(layer: SemanticResult) -> SemanticResult {
    match layer_name(layer, "TT") {
        Ok(layer) => SemanticResult::TapToggleLayer {
            rendered: layer_hint(TAP_TOGGLE_GLYPH, &layer),
            layer,
        },
        Err(e) => e,
    }
}

fn mod_mask(value: SemanticResult, action: &str) -> Result<Vec<Modifier>, SemanticResult> {
    match value {
        SemanticResult::Keycode(mask) => Modifier::from_mod_mask(&mask)
            .ok_or_else(|| SemanticResult::error(format!("{}: unknown mod mask '{}'", action, mask))),
        SemanticResult::Error { .. } => Err(value),
        other => Err(SemanticResult::error(format!(
            "{} needs a mod mask, got a {}",
            action,
            other.kind()
        ))),
    }
}

/// `OSM(mod_mask)`
pub fn one_shot_modifier(mask: SemanticResult) -> SemanticResult {
    match mod_mask(mask, "OSM") {
        Ok(mods) => SemanticResult::OneShotModifier {
            rendered: Rendered::center(format!("{}{}", ONE_SHOT_GLYPH, short_text(&mods))),
            mods,
        },
        Err(e) => e,
    }
}

/// `MT(mod_mask, kc)`
pub fn mod_tap_mask(mask: SemanticResult, keycode: SemanticResult) -> SemanticResult {
    match mod_mask(mask, "MT") {
        Ok(mods) => mod_tap(apply_modifiers(keycode, &mods)),
        Err(e) => e,
    }
}

/// Resolve a bare word
///
/// Applies, in order: the alias table, the expansion alias table and the
/// shifted-symbol table. A word no table knows is passed through.
pub fn resolve_word(word: &str) -> SemanticResult {
    let canonical = lookup(ALIASES, word).unwrap_or(word);
    let symbolic = lookup(EXPANSION_ALIASES, canonical).unwrap_or(canonical);

    match lookup(SHIFTED_SYMBOLS, symbolic) {
        Some(base) => apply_modifier(SemanticResult::Keycode(base.to_string()), Modifier::LShift),
        None => SemanticResult::Keycode(symbolic.to_string()),
    }
}

/// Moves exactly `N` arguments into an array
fn take_args<const N: usize>(
    name: &str,
    args: Vec<SemanticResult>,
) -> Result<[SemanticResult; N], SemanticResult> {
    args.try_into().map_err(|args: Vec<SemanticResult>| {
        SemanticResult::error(format!(
            "{} expects {} argument(s), got {}",
            name,
            N,
            args.len()
        ))
    })
}

/// Executor implementing keyboard semantics
pub struct KeymapExecutor {
    functions: HashMap<String, Function<SemanticResult>>,
}

impl KeymapExecutor {
    pub fn new() -> Self {
        let mut executor = Self {
            functions: HashMap::new(),
        };

        for (name, mods) in MODIFIER_FUNCTIONS {
            let mods: &'static [Modifier] = *mods;
            executor.register_unary(name, move |v| apply_modifiers(v, mods));
            executor.register_unary(&format!("{}_T", name), move |v| mod_tap(apply_modifiers(v, mods)));
        }

        for (alias, target) in TAP_ALIASES {
            if let Some((_, mods)) = MODIFIER_FUNCTIONS.iter().find(|(name, _)| name == target) {
                let mods: &'static [Modifier] = *mods;
                executor.register_unary(alias, move |v| mod_tap(apply_modifiers(v, mods)));
            }
        }

        executor.register_unary("MO", momentary_layer);
        executor.register_unary("TG", toggle_layer);
        executor.register_unary("OSL", one_shot_layer);
        executor.register_unary("TO", to_layer);
        executor.register_unary("DF", default_layer);
        executor.register_unary("TT", tap_toggle_layer);
        executor.register_unary("OSM", one_shot_modifier);
        executor.register_binary("LT", layer_tap);
        executor.register_binary("MT", mod_tap_mask);

        executor
    }

    fn register_unary(
        &mut self,
        name: &str,
        f: impl Fn(SemanticResult) -> SemanticResult + Send + Sync + 'static,
    ) {
        let owned = name.to_string();
        let function: Function<SemanticResult> = Box::new(move |args| match take_args::<1>(&owned, args) {
            Ok([value]) => f(value),
            Err(e) => e,
        });
        self.functions.insert(name.to_string(), function);
    }

    fn register_binary(
        &mut self,
        name: &str,
        f: impl Fn(SemanticResult, SemanticResult) -> SemanticResult + Send + Sync + 'static,
    ) {
        let owned = name.to_string();
        let function: Function<SemanticResult> = Box::new(move |args| match take_args::<2>(&owned, args) {
            Ok([a, b]) => f(a, b),
            Err(e) => e,
        });
        self.functions.insert(name.to_string(), function);
    }

    /// Names of all known functions, sorted
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for KeymapExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for KeymapExecutor {
    type Output = SemanticResult;

    fn word(&self, content: &str) -> SemanticResult {
        resolve_word(content)
    }

    fn function(&self, name: &str) -> Option<&Function<SemanticResult>> {
        self.functions.get(name)
    }
}
