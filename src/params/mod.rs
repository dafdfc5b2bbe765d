//! Parameter registry: declaration, lock-free storage and per-block snapshots.
//!
//! The store owns one slot per declared parameter. The control thread writes
//! slots with [`ParameterStore::set`]; the audio thread reads every slot once
//! at the start of a block into a plain [`ParameterSnapshot`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod layout;
pub mod snapshot;
pub mod store;

pub use layout::SaturatorParams;
pub use snapshot::ParameterSnapshot;
pub use store::ParameterStore;

/// Errors surfaced by the parameter registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// A key was looked up that was never declared.
    #[error("unknown parameter key '{0}'")]
    UnknownKey(String),

    /// A key was declared twice.
    #[error("parameter key '{0}' is already declared")]
    DuplicateKey(String),
}

/// Index of a declared parameter inside its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterHandle(usize);

impl ParameterHandle {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Semantic kind of a parameter together with its declared bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Continuous {
        min: f32,
        max: f32,
        unit: Option<&'static str>,
    },
    Discrete {
        choices: &'static [&'static str],
    },
    Boolean,
}

impl ParamKind {
    pub const fn continuous(min: f32, max: f32) -> Self {
        Self::Continuous {
            min,
            max,
            unit: None,
        }
    }

    pub const fn decibels(min: f32, max: f32) -> Self {
        Self::Continuous {
            min,
            max,
            unit: Some("dB"),
        }
    }

    pub const fn choice(choices: &'static [&'static str]) -> Self {
        Self::Discrete { choices }
    }

    /// Force a raw value into the declared range or choice set.
    ///
    /// Continuous values are clamped, discrete values are rounded to the
    /// nearest index and clamped, booleans switch at 0.5. NaN maps to the
    /// lowest legal value.
    pub fn constrain(&self, raw: f32) -> f32 {
        match *self {
            Self::Continuous { min, max, .. } => {
                if raw.is_nan() {
                    min
                } else {
                    raw.clamp(min, max)
                }
            }
            Self::Discrete { choices } => {
                if raw.is_nan() {
                    return 0.0;
                }
                let last = choices.len().saturating_sub(1) as f32;
                raw.round().clamp(0.0, last)
            }
            Self::Boolean => {
                if raw >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Interpret an already constrained raw value according to this kind.
    pub fn to_value(&self, raw: f32) -> ParamValue {
        match self {
            Self::Continuous { .. } => ParamValue::Float(raw),
            Self::Discrete { .. } => ParamValue::Choice(raw as usize),
            Self::Boolean => ParamValue::Bool(raw >= 0.5),
        }
    }

    /// Human readable rendering of a raw value, e.g. `6.0 dB`, `Hard`, `On`.
    pub fn format(&self, raw: f32) -> String {
        match *self {
            Self::Continuous { unit: Some(unit), .. } => format!("{raw:.1} {unit}"),
            Self::Continuous { unit: None, .. } => format!("{raw:.2}"),
            Self::Discrete { choices } => choices
                .get(raw as usize)
                .map_or_else(|| format!("#{raw}"), |c| (*c).to_string()),
            Self::Boolean => {
                if raw >= 0.5 {
                    "On".to_string()
                } else {
                    "Off".to_string()
                }
            }
        }
    }
}

/// A parameter value tagged with its variant.
///
/// Serialized untagged so persisted state reads naturally as
/// `true`, `1` or `3.5`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Choice(usize),
    Float(f32),
}

impl ParamValue {
    /// Raw slot representation: booleans are 0/1, choices their index.
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Choice(index) => index as f32,
            Self::Float(value) => value,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value as f32)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        Self::Choice(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHOICES: &[&str] = &["None", "2x", "4x"];

    #[test]
    fn test_continuous_constrain() {
        let kind = ParamKind::decibels(-18.0, 12.0);
        assert_eq!(kind.constrain(-30.0), -18.0);
        assert_eq!(kind.constrain(20.0), 12.0);
        assert_eq!(kind.constrain(3.25), 3.25);
        assert_eq!(kind.constrain(f32::NAN), -18.0);
    }

    #[test]
    fn test_discrete_constrain_rounds_and_clamps() {
        let kind = ParamKind::choice(CHOICES);
        assert_eq!(kind.constrain(1.4), 1.0);
        assert_eq!(kind.constrain(1.6), 2.0);
        assert_eq!(kind.constrain(7.0), 2.0);
        assert_eq!(kind.constrain(-3.0), 0.0);
    }

    #[test]
    fn test_boolean_threshold() {
        assert_eq!(ParamKind::Boolean.constrain(0.49), 0.0);
        assert_eq!(ParamKind::Boolean.constrain(0.5), 1.0);
        assert_eq!(ParamKind::Boolean.to_value(1.0), ParamValue::Bool(true));
    }

    #[test]
    fn test_format() {
        assert_eq!(ParamKind::decibels(0.0, 18.0).format(6.0), "6.0 dB");
        assert_eq!(ParamKind::continuous(0.0, 1.0).format(0.04), "0.04");
        assert_eq!(ParamKind::choice(CHOICES).format(2.0), "4x");
        assert_eq!(ParamKind::Boolean.format(0.0), "Off");
    }

    #[test]
    fn test_value_json_shape() {
        let values = vec![
            ParamValue::Bool(true),
            ParamValue::Choice(2),
            ParamValue::Float(-6.5),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, "[true,2,-6.5]");

        let parsed: Vec<ParamValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, values);
    }
}
