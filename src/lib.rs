//! # GradientKit
//!
//! A gradient infill post-processor for FDM G-code. Infill extrusion is
//! scaled by each move's distance from the walls of its layer, so infill is
//! dense next to the walls and thin in the core.
//!
//! ## Architecture
//!
//! GradientKit is organized as a workspace with multiple crates:
//!
//! 1. **gradientkit-core** - Error types and planar geometry
//! 2. **gradientkit-gcode** - Line model, slicer dialects, parsing, layer segmentation, output
//! 3. **gradientkit-engine** - Gradient configuration, flow engine, Z gradient, pipeline
//! 4. **gradientkit-settings** - Settings files and validation
//! 5. **gradientkit** - Command line host that integrates all crates

pub mod cli;

pub use gradientkit_core::{Error, GcodeError, GradientError, Point2, Result, WallSet};
pub use gradientkit_engine::{
    process, Diagnostic, GradientConfig, GradientFlowEngine, PipelineOptions, ProcessedOutput,
    RewriteReport, ZGradient,
};
pub use gradientkit_gcode::{ParsePolicy, SlicerDialect};
pub use gradientkit_settings::{Settings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr, leaving stdout to the slicer host
/// - RUST_LOG environment variable support
/// - INFO by default, DEBUG with `verbose`
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
