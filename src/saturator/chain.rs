use crate::params::ParameterSnapshot;
use crate::saturator::stages::Stage;
use crate::saturator::stages::analog::AnalogStage;
use crate::saturator::stages::clipper::ClipperStage;

// SaturationChain holds the nonlinear part of the signal path: clipper, then analog.
// It carries no state between samples, so it runs unchanged at any sample rate.
#[derive(Debug, Default)]
pub struct SaturationChain {
    clipper: ClipperStage,
    analog: AnalogStage,
}

impl SaturationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&mut self, snapshot: &ParameterSnapshot) {
        self.clipper.configure(snapshot);
        self.analog.configure(snapshot);
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let clipped = self.clipper.process(input);
        self.analog.process(clipped)
    }

    // process_block processes a block of samples through the entire chain.
    pub fn process_block(&mut self, input: &mut [f32]) {
        for sample in input.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub const fn clipper(&self) -> &ClipperStage {
        &self.clipper
    }

    pub const fn analog(&self) -> &AnalogStage {
        &self.analog
    }
}
