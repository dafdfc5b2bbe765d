pub mod analog;
pub mod clipper;
pub mod common;
pub mod level;

use crate::params::ParameterSnapshot;

// The core trait that all processing stages must implement
pub trait Stage: Send + 'static {
    // Pick up the control values for the coming block
    fn configure(&mut self, snapshot: &ParameterSnapshot);

    // Process a single sample through this stage
    fn process(&mut self, input: f32) -> f32;

    // Process a block of samples through this stage
    fn process_block(&mut self, input: &mut [f32]) {
        for sample in input.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}
