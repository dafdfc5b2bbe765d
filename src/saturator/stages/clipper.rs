use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::params::ParameterSnapshot;
use crate::saturator::stages::Stage;

#[derive(ValueEnum, Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SaturationType {
    #[default]
    Soft, // Clean signal with a small tanh component blended in
    Hard, // Flat ceiling at +/-1.0
}

impl std::fmt::Display for SaturationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Soft => write!(f, "Soft"),
            Self::Hard => write!(f, "Hard"),
        }
    }
}

impl SaturationType {
    pub const CHOICES: &'static [&'static str] = &["Soft", "Hard"];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Soft),
            1 => Some(Self::Hard),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn process(self, input: f32, soft: SoftClip) -> f32 {
        match self {
            Self::Soft => soft.apply(input),
            Self::Hard => input.clamp(-1.0, 1.0),
        }
    }
}

/// Parallel tanh saturation.
///
/// The input is shifted by `dc_offset`, a `mix` amount of `tanh(drive * x)`
/// is added, and the shift is removed again:
///
/// `y = x + mix * tanh(drive * (x + dc_offset))`
///
/// With `mix == 0` or `drive == 0` the output is exactly the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftClip {
    pub mix: f32,
    pub drive: f32,
    pub dc_offset: f32,
}

impl Default for SoftClip {
    fn default() -> Self {
        Self {
            mix: 0.04,
            drive: 0.0,
            dc_offset: 0.0,
        }
    }
}

impl SoftClip {
    #[inline]
    pub fn apply(self, input: f32) -> f32 {
        // (x + dc) + mix * tanh(..) - dc, folded so the shift cancels exactly
        let clipped = (self.drive * (input + self.dc_offset)).tanh();
        self.mix.mul_add(clipped, input)
    }
}

/// Selects and runs the nonlinearity for the current block.
///
/// An unresolved saturation type leaves samples untouched.
#[derive(Debug)]
pub struct ClipperStage {
    saturation: Option<SaturationType>,
    soft: SoftClip,
}

impl Default for ClipperStage {
    fn default() -> Self {
        Self::new(Some(SaturationType::Soft), SoftClip::default())
    }
}

impl ClipperStage {
    pub const fn new(saturation: Option<SaturationType>, soft: SoftClip) -> Self {
        Self { saturation, soft }
    }

    pub const fn saturation(&self) -> Option<SaturationType> {
        self.saturation
    }
}

impl Stage for ClipperStage {
    fn configure(&mut self, snapshot: &ParameterSnapshot) {
        self.saturation = snapshot.saturation_type;
        self.soft = SoftClip {
            mix: snapshot.a_mix,
            drive: snapshot.a_v,
            dc_offset: snapshot.dc_offset,
        };
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        match self.saturation {
            Some(kind) => kind.process(input, self.soft),
            None => input,
        }
    }
}
