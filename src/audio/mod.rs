pub mod block;
pub mod engine;
pub mod samplers;

pub use block::{AudioBlock, BlockError};
pub use engine::SaturationEngine;
pub use samplers::{Oversampling, Samplers};
