pub mod chain;
pub mod stages;

pub use chain::SaturationChain;
pub use stages::Stage;
pub use stages::analog::{AnalogStage, AnalogType};
pub use stages::clipper::{ClipperStage, SaturationType, SoftClip};
pub use stages::level::{GainSource, LevelStage};
