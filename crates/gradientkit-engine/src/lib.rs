//! # GradientKit Engine
//!
//! Distance-driven infill flow rewriting. Provides:
//! - Gradient configuration (thresholds, flows, speeds, sampling)
//! - The flow engine working on segmented layers
//! - Z gradient flow overrides
//! - Run reports and the end-to-end text pipeline

pub mod config;
pub mod engine;
pub mod pipeline;
pub mod report;
pub mod z_gradient;

pub use config::{FlowLimit, GradientConfig, Sampling};
pub use engine::GradientFlowEngine;
pub use pipeline::{process, DialectChoice, PipelineOptions, ProcessedOutput};
pub use report::{Diagnostic, RewriteReport};
pub use z_gradient::ZGradient;
