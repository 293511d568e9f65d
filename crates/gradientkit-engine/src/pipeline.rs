//! End-to-end processing
//!
//! Text in, text out: dialect resolution, parsing, the extrusion mode check,
//! layer segmentation, flow rewriting and serialization. Fatal errors are
//! returned before any output text exists.

use gradientkit_core::{GradientError, Result};
use gradientkit_gcode::{
    split_lines, GcodeParser, LayerSegmenter, NumberFormat, ParsePolicy, SlicerDialect,
    StreamWriter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Diagnostic, GradientConfig, GradientFlowEngine, RewriteReport, ZGradient};

/// Which slicer dialect to parse with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DialectChoice {
    /// Detect from the file's signature comments
    #[default]
    Auto,
    Fixed(SlicerDialect),
}

impl DialectChoice {
    /// Resolve to a concrete dialect for `input`
    pub fn resolve(&self, input: &str) -> std::result::Result<SlicerDialect, GradientError> {
        match self {
            Self::Fixed(dialect) => Ok(*dialect),
            Self::Auto => SlicerDialect::detect(split_lines(input).map(|(text, _)| text))
                .ok_or(GradientError::DialectNotDetected),
        }
    }
}

/// Everything needed to process one file
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub dialect: DialectChoice,
    pub policy: ParsePolicy,
    pub gradient: GradientConfig,
    pub z_gradient: Option<ZGradient>,
    pub format: NumberFormat,
}

impl PipelineOptions {
    pub fn new(gradient: GradientConfig) -> Self {
        Self {
            dialect: DialectChoice::Auto,
            policy: ParsePolicy::Strict,
            gradient,
            z_gradient: None,
            format: NumberFormat::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: SlicerDialect) -> Self {
        self.dialect = DialectChoice::Fixed(dialect);
        self
    }

    pub fn with_policy(mut self, policy: ParsePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Rewritten text and what happened to it
#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    pub text: String,
    pub report: RewriteReport,
}

/// Run the whole rewrite over `input`
pub fn process(input: &str, options: &PipelineOptions) -> Result<ProcessedOutput> {
    let dialect = options.dialect.resolve(input)?;
    debug!("Using the {} dialect", dialect);

    let parser = GcodeParser::new(dialect.recognizer());
    let stream = parser.parse_stream(input, options.policy)?;
    GradientFlowEngine::check_extrusion_mode(&stream.records)?;

    let mut report = RewriteReport::new();
    report.dialect = Some(dialect);
    for skipped in &stream.skipped {
        report.push(Diagnostic::MalformedCommandSkipped {
            line_number: skipped.line_number(),
            reason: skipped.to_string(),
        });
    }

    let layers = LayerSegmenter::new().segment(stream.records);
    let mut engine = GradientFlowEngine::new(options.gradient.clone())
        .with_writer(StreamWriter::new(options.format));
    if let Some(z_gradient) = options.z_gradient {
        engine = engine.with_z_gradient(z_gradient);
    }
    let lines = engine.rewrite(&layers, &mut report);

    if report.arcs_skipped > 0 {
        warn!(
            "{} extruding arc moves in infill were left unchanged; disable arc fitting to grade them",
            report.arcs_skipped
        );
    }
    if report.moves_modified == 0 {
        warn!(
            "No infill moves were modified; check that the file was sliced with {} and uses sparse infill",
            dialect
        );
    }
    info!(
        "Processed {} layers: {} moves modified, {} lines injected, {} diagnostics",
        report.layers,
        report.moves_modified,
        report.lines_injected,
        report.diagnostics.len()
    );

    Ok(ProcessedOutput {
        text: StreamWriter::join(&lines),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_dialect_requires_signature() {
        let config = GradientConfig::new(vec![0.0, 10.0], &[100.0, 50.0]).unwrap();
        let err = process("G28\nG1 X1 Y1 E1\n", &PipelineOptions::new(config)).unwrap_err();
        assert!(matches!(
            err,
            gradientkit_core::Error::Gradient(GradientError::DialectNotDetected)
        ));
    }

    #[test]
    fn test_fixed_dialect_skips_detection() {
        let choice = DialectChoice::Fixed(SlicerDialect::Cura);
        assert_eq!(choice.resolve("G28\n"), Ok(SlicerDialect::Cura));
        assert_eq!(
            DialectChoice::Auto.resolve("; generated by PrusaSlicer 2.8.0\n"),
            Ok(SlicerDialect::Prusa)
        );
    }
}
