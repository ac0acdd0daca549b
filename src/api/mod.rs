//! Contains the high level pipeline builder API.

mod palette_pipeline;

pub use palette_pipeline::PalettePipeline;
