//! Keybind strings: normalization, parsing, and per-frame matching.
//!
//! A chord is written as `+`-separated tokens, e.g. `"ctrl+shift+b"`. The
//! tokens `ctrl`, `shift` and `alt` are modifiers; anything else is the
//! primary key. Only single letters are supported as primary keys. An empty
//! string disables the binding.

use std::fmt;
use thiserror::Error;

use crate::config::KeybindConfig;
use crate::input::{InputSnapshot, Key, Modifiers};
use crate::viewer::Action;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeybindError {
    #[error("keybind \"{chord}\" has no primary key")]
    MissingKey { chord: String },
    #[error("keybind \"{chord}\": unsupported key \"{key}\" (only single letters are supported)")]
    UnsupportedKey { chord: String, key: String },
}

/// Canonical form: lowercase, trimmed tokens joined by `+`, in the order the
/// user wrote them. Empty tokens are dropped.
pub fn normalize(raw: &str) -> String {
    raw.split('+')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join("+")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKey {
    None,
    Letter(char),
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybind {
    pub modifiers: Modifiers,
    pub key: PrimaryKey,
}

impl Keybind {
    pub const DISABLED: Keybind = Keybind {
        modifiers: Modifiers {
            ctrl: false,
            shift: false,
            alt: false,
        },
        key: PrimaryKey::None,
    };

    /// Edge-triggered, exact-modifier match: extra or missing modifiers fail,
    /// and a held key fires only on the frame it went down.
    pub fn matches(&self, input: &InputSnapshot) -> bool {
        let PrimaryKey::Letter(c) = &self.key else {
            return false;
        };
        self.modifiers == input.modifiers && input.key_pressed(Key::Char(*c))
    }
}

impl fmt::Display for Keybind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.modifiers.ctrl {
            parts.push("Ctrl".into());
        }
        if self.modifiers.shift {
            parts.push("Shift".into());
        }
        if self.modifiers.alt {
            parts.push("Alt".into());
        }
        match &self.key {
            PrimaryKey::None => {}
            PrimaryKey::Letter(c) => parts.push(c.to_ascii_uppercase().to_string()),
            PrimaryKey::Unsupported(s) => parts.push(format!("{s}?")),
        }
        if parts.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

/// Parse a chord. Modifier tokens may appear in any order. When several
/// non-modifier tokens are present the last one wins.
pub fn parse(canonical: &str) -> Keybind {
    parse_tokens(canonical).0
}

/// Like [`parse`], also returning how many primary-key tokens were seen.
fn parse_tokens(canonical: &str) -> (Keybind, usize) {
    let mut bind = Keybind::DISABLED;
    let mut key_tokens = 0;
    for token in canonical.split('+').map(str::trim).filter(|t| !t.is_empty()) {
        match token.to_lowercase().as_str() {
            "ctrl" => bind.modifiers.ctrl = true,
            "shift" => bind.modifiers.shift = true,
            "alt" => bind.modifiers.alt = true,
            other => {
                key_tokens += 1;
                bind.key = letter(other)
                    .map(PrimaryKey::Letter)
                    .unwrap_or_else(|| PrimaryKey::Unsupported(other.to_string()));
            }
        }
    }
    (bind, key_tokens)
}

fn letter(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

/// Normalize and parse a user-entered string, reporting why it can never fire.
/// Empty input is a deliberate "disabled" and is not an error.
pub fn parse_user(raw: &str) -> (Keybind, Option<KeybindError>) {
    let chord = normalize(raw);
    if chord.is_empty() {
        return (Keybind::DISABLED, None);
    }
    let (bind, key_tokens) = parse_tokens(&chord);
    if key_tokens > 1 {
        log::debug!("keybind \"{chord}\" names {key_tokens} keys, using the last one");
    }
    let err = match &bind.key {
        PrimaryKey::Letter(_) => None,
        PrimaryKey::None => Some(KeybindError::MissingKey {
            chord: chord.clone(),
        }),
        PrimaryKey::Unsupported(key) => Some(KeybindError::UnsupportedKey {
            chord: chord.clone(),
            key: key.clone(),
        }),
    };
    (bind, err)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Binding {
    pub action: Action,
    pub chord: String,
    pub keybind: Keybind,
    /// Why the chord was disabled, if it was. Logged once when parsed.
    pub problem: Option<KeybindError>,
}

/// The five configurable viewer chords.
#[derive(Debug, Clone)]
pub struct KeybindRegistry {
    bindings: Vec<Binding>,
}

impl KeybindRegistry {
    pub fn from_config(config: &KeybindConfig) -> Self {
        let entries = [
            (Action::NextImage, &config.next_image),
            (Action::PreviousImage, &config.previous_image),
            (Action::ZoomIn, &config.zoom_in),
            (Action::ZoomOut, &config.zoom_out),
            (Action::ToggleVisibility, &config.toggle_visibility),
        ];
        let bindings = entries
            .into_iter()
            .map(|(action, raw)| Self::bind(action, raw))
            .collect();
        Self { bindings }
    }

    fn bind(action: Action, raw: &str) -> Binding {
        let (keybind, problem) = parse_user(raw);
        if let Some(err) = &problem {
            log::warn!("{} disabled: {}", action.describe(), err);
        }
        Binding {
            action,
            chord: normalize(raw),
            keybind,
            problem,
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn chord_for(&self, action: Action) -> Option<&Keybind> {
        self.bindings
            .iter()
            .find(|b| b.action == action)
            .map(|b| &b.keybind)
    }

    /// Actions whose chord fired this frame, in registry order.
    pub fn triggered(&self, input: &InputSnapshot) -> Vec<Action> {
        self.bindings
            .iter()
            .filter(|b| b.keybind.matches(input))
            .map(|b| b.action)
            .collect()
    }
}
