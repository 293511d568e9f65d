//! Run report and non-fatal diagnostics

use gradientkit_gcode::SlicerDialect;
use serde::{Deserialize, Serialize};

/// A recoverable condition met while rewriting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Zero-length infill extrusion, passed through unchanged
    DegenerateMove { line_number: usize, layer: usize },
    /// Unparseable line kept verbatim under the lenient policy
    MalformedCommandSkipped { line_number: usize, reason: String },
    /// Layer with infill but no walls, infill gets the innermost flow
    EmptyWallSet { layer: usize },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateMove { line_number, layer } => write!(
                f,
                "Degenerate infill move at line {} (layer {}) left unchanged",
                line_number, layer
            ),
            Self::MalformedCommandSkipped {
                line_number,
                reason,
            } => write!(f, "Malformed line {} kept verbatim: {}", line_number, reason),
            Self::EmptyWallSet { layer } => write!(
                f,
                "Layer {} has infill but no walls; using the innermost flow",
                layer
            ),
        }
    }
}

/// Summary of one rewrite run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewriteReport {
    pub dialect: Option<SlicerDialect>,
    pub layers: usize,
    pub moves_modified: usize,
    pub lines_injected: usize,
    /// Extruding G2/G3 infill moves passed through without grading
    pub arcs_skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl RewriteReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Count diagnostics matching `predicate`
    pub fn count_where(&self, predicate: impl Fn(&Diagnostic) -> bool) -> usize {
        self.diagnostics.iter().filter(|d| predicate(d)).count()
    }
}
