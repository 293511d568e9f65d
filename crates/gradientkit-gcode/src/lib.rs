//! # GradientKit G-Code
//!
//! Line-level G-code handling for the gradient infill engine: slicer dialect
//! recognition, parsing with byte spans, print-state tracking, layer
//! segmentation and byte-stable output.

pub mod command;
pub mod dialect;
pub mod parser;
pub mod segmenter;
pub mod state;
pub mod writer;

pub use command::*;
pub use dialect::*;
pub use parser::*;
pub use segmenter::*;
pub use state::*;
pub use writer::*;
