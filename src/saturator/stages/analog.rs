use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::params::ParameterSnapshot;
use crate::saturator::stages::Stage;

#[derive(ValueEnum, Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnalogType {
    #[default]
    None,
    Transformer,
    Tape,
}

impl std::fmt::Display for AnalogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Transformer => write!(f, "Transformer"),
            Self::Tape => write!(f, "Tape"),
        }
    }
}

impl AnalogType {
    pub const CHOICES: &'static [&'static str] = &["None", "Transformer", "Tape"];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::Transformer),
            2 => Some(Self::Tape),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Secondary "analog" colouring after the clipper.
///
/// Transformer and tape models are not implemented yet: the stage tracks its
/// controls but always passes the signal through unchanged.
#[derive(Debug, Default)]
pub struct AnalogStage {
    model: AnalogType,
    drive: bool,
    transformerize: f32,
    even_amount: f32,
}

impl AnalogStage {
    pub const fn model(&self) -> AnalogType {
        self.model
    }

    pub const fn drive(&self) -> bool {
        self.drive
    }

    pub const fn transformerize(&self) -> f32 {
        self.transformerize
    }

    pub const fn even_amount(&self) -> f32 {
        self.even_amount
    }
}

impl Stage for AnalogStage {
    fn configure(&mut self, snapshot: &ParameterSnapshot) {
        self.model = snapshot.analog_type;
        self.drive = snapshot.analog_drive;
        self.transformerize = snapshot.transformerize;
        self.even_amount = snapshot.even_amount;
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analog_stage_is_identity_for_every_model() {
        for model in [AnalogType::None, AnalogType::Transformer, AnalogType::Tape] {
            let mut stage = AnalogStage::default();
            stage.configure(&ParameterSnapshot {
                analog_type: model,
                analog_drive: true,
                transformerize: 1.0,
                even_amount: 1.0,
                ..ParameterSnapshot::default()
            });

            assert_eq!(stage.model(), model);
            assert!(stage.drive());

            let mut block = [-1.5, -0.2, 0.0, 0.7, 3.0];
            stage.process_block(&mut block);
            assert_eq!(block, [-1.5, -0.2, 0.0, 0.7, 3.0]);
        }
    }

    #[test]
    fn test_index_mapping() {
        assert_eq!(AnalogType::from_index(1), Some(AnalogType::Transformer));
        assert_eq!(AnalogType::from_index(3), None);
        assert_eq!(AnalogType::CHOICES[AnalogType::Tape.index()], "Tape");
    }
}
