use crate::audio::samplers::Oversampling;
use crate::saturator::{AnalogType, SaturationType};

/// Control values resolved once at the start of a block.
///
/// A plain value type: the audio thread owns its copy for the whole block,
/// so automation arriving mid-block cannot tear it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub input_gain_db: f32,
    pub output_gain_db: f32,
    /// `None` when the stored selection does not name a known shape.
    pub saturation_type: Option<SaturationType>,
    pub analog_type: AnalogType,
    pub analog_drive: bool,
    pub oversampling: Oversampling,
    pub soft_limit_coefficient: f32,
    pub transformerize: f32,
    pub even_amount: f32,
    pub a_mix: f32,
    pub a_v: f32,
    pub dc_offset: f32,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            input_gain_db: 0.0,
            output_gain_db: 0.0,
            saturation_type: Some(SaturationType::Soft),
            analog_type: AnalogType::None,
            analog_drive: false,
            oversampling: Oversampling::None,
            soft_limit_coefficient: 1.0,
            transformerize: 0.1,
            even_amount: 0.0,
            a_mix: 0.04,
            a_v: 0.0,
            dc_offset: 0.0,
        }
    }
}

impl ParameterSnapshot {
    /// Snapshot with every nonlinearity disabled: soft clip with no mix.
    pub fn transparent() -> Self {
        Self {
            a_mix: 0.0,
            ..Self::default()
        }
    }
}
