#![forbid(unsafe_code)]

pub mod animate;
pub mod compose;
pub mod config;
pub mod delivery;
pub mod edit;
pub mod error;
pub mod frames;
pub mod pipeline;
pub mod sources;
pub mod switches;

pub use compose::Axis;
pub use config::{RunConfig, RunLock};
pub use error::{FigpipeError, FigpipeResult};
pub use frames::{FrameSet, NameFilter};
pub use pipeline::{Pipeline, RunReport};
pub use sources::{CropRect, EditRule, EditSpec, Marker};
pub use switches::Switches;
