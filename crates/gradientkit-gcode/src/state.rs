//! Print state tracking
//!
//! The cursor is advanced as a pure fold: `state.advance(&record)` returns the
//! state after the record without mutating the input, so any prefix of a
//! stream can be replayed in a test without building a whole file.

use gradientkit_core::Point2;
use serde::{Deserialize, Serialize};

use super::{ExtrusionMode, PositioningMode, Record, RecordKind};

/// Absolute machine position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Projection onto the XY plane
    pub fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Cursor state needed to resolve moves that omit coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PrintState {
    pub position: Position,
    /// Modal feed rate (mm/min) as programmed in the input
    pub feed_rate: Option<f64>,
    /// Last declared extrusion mode, `None` until M82/M83 is seen
    pub extrusion_mode: Option<ExtrusionMode>,
    pub positioning: PositioningMode,
}

impl PrintState {
    /// Create a state at the origin with nothing declared
    pub fn new() -> Self {
        Self::default()
    }

    /// State after executing `record`
    pub fn advance(&self, record: &Record) -> PrintState {
        let mut next = *self;
        match &record.kind {
            RecordKind::Move(mv) => {
                let resolve = |current: f64, word: Option<f64>| match (word, self.positioning) {
                    (None, _) => current,
                    (Some(v), PositioningMode::Absolute) => v,
                    (Some(v), PositioningMode::Relative) => current + v,
                };
                next.position = Position::new(
                    resolve(self.position.x, mv.x),
                    resolve(self.position.y, mv.y),
                    resolve(self.position.z, mv.z),
                );
                if mv.f.is_some() {
                    next.feed_rate = mv.f;
                }
            }
            RecordKind::SetPosition(set) => {
                next.position = Position::new(
                    set.x.unwrap_or(self.position.x),
                    set.y.unwrap_or(self.position.y),
                    set.z.unwrap_or(self.position.z),
                );
            }
            RecordKind::ExtrusionMode(mode) => next.extrusion_mode = Some(*mode),
            RecordKind::Positioning(mode) => next.positioning = *mode,
            RecordKind::LayerChange | RecordKind::TypeChange(_) | RecordKind::Passthrough => {}
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GcodeParser, LineEnding, OrcaRecognizer};
    use std::sync::Arc;

    fn fold(lines: &[&str]) -> PrintState {
        let parser = GcodeParser::new(Arc::new(OrcaRecognizer));
        lines
            .iter()
            .enumerate()
            .map(|(i, l)| parser.parse_line(i + 1, l, LineEnding::Lf).unwrap())
            .fold(PrintState::new(), |state, record| state.advance(&record))
    }

    #[test]
    fn test_omitted_axes_keep_position() {
        let state = fold(&["G1 X10 Y20 Z0.2 F3000", "G1 X15 E0.5"]);
        assert_eq!(state.position, Position::new(15.0, 20.0, 0.2));
        assert_eq!(state.feed_rate, Some(3000.0));
    }

    #[test]
    fn test_relative_positioning() {
        let state = fold(&["G1 X10 Y10", "G91", "G1 X5 Y-2", "G90", "G1 X1"]);
        assert_eq!(state.position, Position::new(1.0, 8.0, 0.0));
    }

    #[test]
    fn test_set_position_and_modes() {
        let state = fold(&["G1 X10 Y10", "G92 X0", "M83"]);
        assert_eq!(state.position.x, 0.0);
        assert_eq!(state.position.y, 10.0);
        assert_eq!(state.extrusion_mode, Some(ExtrusionMode::Relative));
    }

    #[test]
    fn test_advance_does_not_mutate_input() {
        let parser = GcodeParser::new(Arc::new(OrcaRecognizer));
        let record = parser.parse_line(1, "G1 X5 Y5", LineEnding::Lf).unwrap();
        let before = PrintState::new();
        let after = before.advance(&record);
        assert_eq!(before.position, Position::default());
        assert_eq!(after.position.xy(), Point2::new(5.0, 5.0));
    }
}
