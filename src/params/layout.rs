//! The saturator's fixed parameter set.

use crate::audio::samplers::Oversampling;
use crate::params::{
    ParamKind, ParameterError, ParameterHandle, ParameterSnapshot, ParameterStore,
};
use crate::saturator::{AnalogType, SaturationType};

pub const INPUT_GAIN: &str = "inputGain";
pub const OUTPUT_GAIN: &str = "outputGain";
pub const SATURATION_TYPE: &str = "saturationType";
pub const ANALOG_TYPE: &str = "analogType";
pub const ANALOG_DRIVE: &str = "analogDrive";
pub const OVERSAMPLING: &str = "oversampling";
pub const SOFT_LIMIT_COEFFICIENT: &str = "softLimitCoefficient";
pub const TRANSFORMERIZE: &str = "transformerize";
pub const EVEN_AMOUNT: &str = "evenAmount";
pub const A_MIX: &str = "A_mix";
pub const A_V: &str = "A_v";
pub const DC_OFFSET: &str = "dcOffset";

/// Typed handles to every saturator parameter.
///
/// Snapshots are read through these handles so the audio thread never looks
/// a parameter up by its string key.
#[derive(Debug, Clone, Copy)]
pub struct SaturatorParams {
    pub input_gain: ParameterHandle,
    pub output_gain: ParameterHandle,
    pub saturation_type: ParameterHandle,
    pub analog_type: ParameterHandle,
    pub analog_drive: ParameterHandle,
    pub oversampling: ParameterHandle,
    pub soft_limit_coefficient: ParameterHandle,
    pub transformerize: ParameterHandle,
    pub even_amount: ParameterHandle,
    pub a_mix: ParameterHandle,
    pub a_v: ParameterHandle,
    pub dc_offset: ParameterHandle,
}

impl SaturatorParams {
    /// Declare the full parameter set, in persistence order.
    pub fn declare(store: &mut ParameterStore) -> Result<Self, ParameterError> {
        Ok(Self {
            input_gain: store.declare(INPUT_GAIN, ParamKind::decibels(0.0, 18.0), 0.0)?,
            output_gain: store.declare(OUTPUT_GAIN, ParamKind::decibels(-18.0, 12.0), 0.0)?,
            saturation_type: store.declare(
                SATURATION_TYPE,
                ParamKind::choice(SaturationType::CHOICES),
                SaturationType::Soft.index(),
            )?,
            analog_type: store.declare(
                ANALOG_TYPE,
                ParamKind::choice(AnalogType::CHOICES),
                AnalogType::None.index(),
            )?,
            analog_drive: store.declare(ANALOG_DRIVE, ParamKind::Boolean, false)?,
            oversampling: store.declare(
                OVERSAMPLING,
                ParamKind::choice(Oversampling::CHOICES),
                Oversampling::None.index(),
            )?,
            soft_limit_coefficient: store.declare(
                SOFT_LIMIT_COEFFICIENT,
                ParamKind::continuous(1.0, 10.0),
                1.0,
            )?,
            transformerize: store.declare(TRANSFORMERIZE, ParamKind::continuous(0.0, 1.0), 0.1)?,
            even_amount: store.declare(EVEN_AMOUNT, ParamKind::continuous(0.0, 1.0), 0.0)?,
            a_mix: store.declare(A_MIX, ParamKind::continuous(0.0, 1.0), 0.04)?,
            a_v: store.declare(A_V, ParamKind::continuous(0.0, 50.0), 0.0)?,
            dc_offset: store.declare(DC_OFFSET, ParamKind::continuous(0.0, 1.0), 0.0)?,
        })
    }

    /// A fresh store holding the saturator parameters at their defaults.
    pub fn new_store() -> Result<(ParameterStore, Self), ParameterError> {
        let mut store = ParameterStore::new();
        let params = Self::declare(&mut store)?;
        Ok((store, params))
    }

    /// Read every slot once. Lock-free and allocation-free.
    pub fn snapshot(&self, store: &ParameterStore) -> ParameterSnapshot {
        let choice = |handle: ParameterHandle| store.value_by_handle(handle) as usize;

        ParameterSnapshot {
            input_gain_db: store.value_by_handle(self.input_gain),
            output_gain_db: store.value_by_handle(self.output_gain),
            saturation_type: SaturationType::from_index(choice(self.saturation_type)),
            analog_type: AnalogType::from_index(choice(self.analog_type)).unwrap_or_default(),
            analog_drive: store.value_by_handle(self.analog_drive) >= 0.5,
            oversampling: Oversampling::from_index(choice(self.oversampling)).unwrap_or_default(),
            soft_limit_coefficient: store.value_by_handle(self.soft_limit_coefficient),
            transformerize: store.value_by_handle(self.transformerize),
            even_amount: store.value_by_handle(self.even_amount),
            a_mix: store.value_by_handle(self.a_mix),
            a_v: store.value_by_handle(self.a_v),
            dc_offset: store.value_by_handle(self.dc_offset),
        }
    }
}
