//! G-Code record types
//!
//! One [`Record`] is produced per input line. Records keep the exact original
//! text so that anything the flow engine does not touch is written back
//! byte-for-byte.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Print region announced by the slicer's type comments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Perimeters / walls
    Wall,
    /// Sparse infill, the only region the gradient rewrites
    Infill,
    /// Solid infill, top and bottom surfaces, bridges
    Skin,
    /// Support structures and interfaces
    Support,
    /// Moves before the first type marker of a layer
    Unknown,
    /// Any other annotated region (custom start code, skirt, wipe tower, ...)
    Other,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wall => write!(f, "WALL"),
            Self::Infill => write!(f, "INFILL"),
            Self::Skin => write!(f, "SKIN"),
            Self::Support => write!(f, "SUPPORT"),
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// Line terminator found after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEnding {
    /// Last line of a file without a trailing newline
    None,
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Motion command word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    /// G0
    Rapid,
    /// G1
    Linear,
    /// G2
    ArcCw,
    /// G3
    ArcCcw,
}

impl MoveKind {
    pub fn is_arc(&self) -> bool {
        matches!(self, Self::ArcCw | Self::ArcCcw)
    }
}

/// Extrusion distance mode (M82 / M83)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtrusionMode {
    Absolute,
    Relative,
}

/// XYZ distance mode (G90 / G91)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositioningMode {
    #[default]
    Absolute,
    Relative,
}

/// A parsed motion command
///
/// Axis words that are absent stay `None` and mean "unchanged". The spans
/// point at the numeric text of E and F inside [`Record::text`] so those
/// values can be replaced in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub kind: MoveKind,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub f: Option<f64>,
    pub e_span: Option<Range<usize>>,
    pub f_span: Option<Range<usize>>,
    /// Byte offset just past the last command word, before any comment
    pub code_end: usize,
}

impl Move {
    /// Whether the move pushes filament forward
    pub fn is_extruding(&self) -> bool {
        self.e.is_some_and(|e| e > 0.0)
    }

    /// Whether the move carries an X or Y word
    pub fn moves_xy(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

/// G92 position override
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SetPosition {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
}

/// Semantic content of a line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordKind {
    Move(Move),
    /// Slicer comment opening a new layer
    LayerChange,
    /// Slicer comment announcing the region of the following moves
    TypeChange(Region),
    ExtrusionMode(ExtrusionMode),
    Positioning(PositioningMode),
    SetPosition(SetPosition),
    /// No geometric meaning, written back verbatim
    Passthrough,
}

/// One line of G-code and what it means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 1-based line number in the input, 0 for synthesised lines
    pub line_number: usize,
    /// Original text without its line terminator
    pub text: String,
    pub ending: LineEnding,
    pub kind: RecordKind,
}

impl Record {
    /// Create a record that carries no semantics
    pub fn passthrough(line_number: usize, text: impl Into<String>, ending: LineEnding) -> Self {
        Self {
            line_number,
            text: text.into(),
            ending,
            kind: RecordKind::Passthrough,
        }
    }

    /// Get the motion command, if this record is one
    pub fn as_move(&self) -> Option<&Move> {
        match &self.kind {
            RecordKind::Move(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_layer_change(&self) -> bool {
        matches!(self.kind, RecordKind::LayerChange)
    }
}

