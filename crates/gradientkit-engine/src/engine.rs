//! Gradient flow engine
//!
//! Rewrites the extrusion of sparse-infill moves according to their distance
//! from the walls printed in the same layer. Works on fully segmented layers,
//! so every wall of a layer is known before its first infill move is touched.

use gradientkit_core::{GradientError, Point2, COINCIDENT_EPSILON};
use gradientkit_gcode::{
    ExtrusionMode, Layer, LineEnding, Move, MoveKind, OutputLine, PositioningMode, PrintState,
    Record, RecordKind, Region, ScannedRecord, StreamWriter,
};
use tracing::{debug, trace, warn};

use crate::{Diagnostic, GradientConfig, RewriteReport, Sampling, ZGradient};

/// One synthesised piece of a subdivided move
#[derive(Debug, Clone, PartialEq)]
struct Piece {
    to: Point2,
    e: f64,
    /// Feed rate the piece should run at, `None` when no feed is known
    feed: Option<f64>,
}

/// What to do with one move
#[derive(Debug, Clone, PartialEq)]
enum MovePlan {
    Keep,
    Rewrite { e: Option<f64>, f: Option<f64> },
    Split(Vec<Piece>),
}

/// Accumulates output lines and the feed rate the output stream is running at
struct Emitter<'a> {
    writer: &'a StreamWriter,
    lines: Vec<OutputLine>,
    /// Modal feed of the emitted stream, which differs from the input's after a feed rewrite
    feed: Option<f64>,
    injected: usize,
}

impl<'a> Emitter<'a> {
    fn new(writer: &'a StreamWriter) -> Self {
        Self {
            writer,
            lines: Vec::new(),
            feed: None,
            injected: 0,
        }
    }

    fn push(&mut self, line: OutputLine) {
        self.lines.push(line);
    }

    /// Append a synthesised line after the last emitted one
    fn inject_after(&mut self, text: String) {
        let ending = match self.lines.last_mut() {
            Some(last) if last.ending == LineEnding::None => {
                last.ending = LineEnding::Lf;
                LineEnding::None
            }
            Some(last) => last.ending,
            None => LineEnding::Lf,
        };
        self.lines.push(OutputLine::new(text, ending));
        self.injected += 1;
    }

    /// Append a synthesised line ahead of a record ending with `next`
    fn inject_before(&mut self, text: String, next: LineEnding) {
        let ending = match next {
            LineEnding::None => LineEnding::Lf,
            other => other,
        };
        self.lines.push(OutputLine::new(text, ending));
        self.injected += 1;
    }

    /// Put the emitted stream back on `feed` before a line that relies on the modal feed
    fn restore_feed(&mut self, feed: Option<f64>, next: LineEnding) {
        if let Some(target) = feed {
            if self.feed != Some(target) {
                let text = self.writer.render_feed(target);
                self.inject_before(text, next);
                self.feed = Some(target);
            }
        }
    }
}

/// Distance-driven flow rewriter
pub struct GradientFlowEngine {
    config: GradientConfig,
    writer: StreamWriter,
    z_gradient: Option<ZGradient>,
}

impl GradientFlowEngine {
    pub fn new(config: GradientConfig) -> Self {
        Self {
            config,
            writer: StreamWriter::default(),
            z_gradient: None,
        }
    }

    pub fn with_writer(mut self, writer: StreamWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_z_gradient(mut self, z_gradient: ZGradient) -> Self {
        self.z_gradient = Some(z_gradient);
        self
    }

    pub fn config(&self) -> &GradientConfig {
        &self.config
    }

    /// Reject streams that extrude while in absolute extrusion mode
    ///
    /// Only moves carrying an E word are checked, so an `M82` that is
    /// overridden before printing or restored after the last extrusion is
    /// accepted. Streams that never declare an extrusion mode are accepted.
    pub fn check_extrusion_mode(records: &[Record]) -> Result<(), GradientError> {
        let mut state = PrintState::new();
        for record in records {
            let extrudes = record.as_move().is_some_and(|mv| mv.e.is_some());
            if extrudes && state.extrusion_mode == Some(ExtrusionMode::Absolute) {
                return Err(GradientError::IncompatibleMode {
                    line_number: record.line_number,
                });
            }
            state = state.advance(record);
        }
        Ok(())
    }

    /// Rewrite every layer, returning the output lines in order
    pub fn rewrite(&self, layers: &[Layer], report: &mut RewriteReport) -> Vec<OutputLine> {
        let total_layers = layers.iter().filter(|l| l.has_marker).count();
        let mut emitter = Emitter::new(&self.writer);
        let mut layer_number = 0;

        for layer in layers {
            if layer.has_marker {
                layer_number += 1;
            }
            if layer.has_marker && layer.walls.is_empty() && layer.infill_move_count() > 0 {
                warn!("Layer {} has infill but no walls", layer.index);
                report.push(Diagnostic::EmptyWallSet { layer: layer.index });
            }
            debug!(
                "Layer {}: {} records, {} wall segments",
                layer.index,
                layer.records.len(),
                layer.walls.segment_count()
            );

            for scanned in &layer.records {
                let record = &scanned.record;
                let Some(mv) = record.as_move() else {
                    emitter.push(OutputLine::verbatim(record));
                    if let (Some(z), RecordKind::TypeChange(region)) = (&self.z_gradient, &record.kind) {
                        for text in z.lines_after_marker(*region, layer_number, total_layers) {
                            emitter.inject_after(text);
                        }
                    }
                    continue;
                };

                // The preamble before the first layer marker is never rewritten
                let plan = if layer.has_marker && scanned.region == Region::Infill {
                    self.plan_infill_move(layer, scanned, mv, report)
                } else {
                    MovePlan::Keep
                };
                self.emit(&mut emitter, scanned, mv, plan, report);
            }
        }

        report.layers = total_layers;
        report.lines_injected += emitter.injected;
        emitter.lines
    }

    fn emit(
        &self,
        emitter: &mut Emitter<'_>,
        scanned: &ScannedRecord,
        mv: &Move,
        plan: MovePlan,
        report: &mut RewriteReport,
    ) {
        let record = &scanned.record;
        match plan {
            MovePlan::Keep => {
                if mv.f.is_some() {
                    emitter.feed = mv.f;
                } else {
                    emitter.restore_feed(scanned.before.feed_rate, record.ending);
                }
                emitter.push(OutputLine::verbatim(record));
            }
            MovePlan::Rewrite { e, f } => {
                match (f, mv.f) {
                    (Some(new), _) => emitter.feed = Some(new),
                    (None, Some(own)) => emitter.feed = Some(own),
                    (None, None) => emitter.restore_feed(scanned.before.feed_rate, record.ending),
                }
                emitter.push(self.writer.rewrite_record(record, e, f));
                report.moves_modified += 1;
            }
            MovePlan::Split(pieces) => {
                let count = pieces.len();
                for (i, piece) in pieces.into_iter().enumerate() {
                    let f = match piece.feed {
                        Some(target) if emitter.feed != Some(target) => Some(target),
                        _ => None,
                    };
                    if f.is_some() {
                        emitter.feed = f;
                    }
                    let ending = match record.ending {
                        LineEnding::None if i + 1 < count => LineEnding::Lf,
                        other => other,
                    };
                    emitter.push(OutputLine::new(
                        self.writer.render_linear_move(piece.to, piece.e, f),
                        ending,
                    ));
                }
                emitter.injected += count.saturating_sub(1);
                report.moves_modified += 1;
            }
        }
    }

    fn wall_distance(&self, layer: &Layer, point: &Point2) -> f64 {
        layer
            .walls
            .distance_to_point(point)
            .unwrap_or_else(|| self.config.max_threshold())
    }

    /// Whether a sample this far from the walls is left alone
    fn in_untouched_core(&self, distance: f64) -> bool {
        !self.config.thin_inner_core() && distance > self.config.max_threshold()
    }

    /// New feed rate for an infill move, `None` if it stays the same
    fn plan_feed(&self, feed: Option<f64>, distance: f64, length: f64, e: f64) -> Option<f64> {
        let feed = feed?;
        let mut planned = match self.config.speed_for(distance, length) {
            Some(speed) => feed * speed,
            None => feed,
        };
        if let Some(capped) = self
            .config
            .flow_limit()
            .and_then(|limit| limit.cap_feed(planned, e, length))
        {
            planned = capped;
        }
        ((planned - feed).abs() > 1e-9).then_some(planned)
    }

    fn plan_infill_move(
        &self,
        layer: &Layer,
        scanned: &ScannedRecord,
        mv: &Move,
        report: &mut RewriteReport,
    ) -> MovePlan {
        if !scanned.is_extruding_xy_move() {
            return MovePlan::Keep;
        }
        if mv.kind.is_arc() {
            debug!(
                "Extruding arc in infill at line {} left unchanged",
                scanned.record.line_number
            );
            report.arcs_skipped += 1;
            return MovePlan::Keep;
        }
        let Some(e) = mv.e.filter(|_| mv.kind == MoveKind::Linear) else {
            return MovePlan::Keep;
        };

        let length = scanned.xy_length();
        if length <= COINCIDENT_EPSILON {
            let line_number = scanned.record.line_number;
            warn!("Degenerate infill move at line {}", line_number);
            report.push(Diagnostic::DegenerateMove {
                line_number,
                layer: layer.index,
            });
            return MovePlan::Keep;
        }

        let start = scanned.before.position.xy();
        let end = scanned.after.position.xy();
        match self.config.sampling() {
            Sampling::Subdivide { length: piece }
                if length > 2.0 * piece
                    && mv.z.is_none()
                    && scanned.before.positioning == PositioningMode::Absolute =>
            {
                self.plan_split(layer, scanned, start, end, e, length, piece)
            }
            _ => {
                let distance = self.wall_distance(layer, &start.midpoint(&end));
                if self.in_untouched_core(distance) {
                    return MovePlan::Keep;
                }
                let flow = self.config.flow_for(distance, length);
                let new_e = e * flow;
                let e_changed = (flow - 1.0).abs() > f64::EPSILON;
                let f = self.plan_feed(scanned.after.feed_rate, distance, length, new_e);
                trace!(
                    "Line {}: length {:.3} distance {:.3} flow {:.4}",
                    scanned.record.line_number,
                    length,
                    distance,
                    flow
                );
                if !e_changed && f.is_none() {
                    return MovePlan::Keep;
                }
                MovePlan::Rewrite {
                    e: e_changed.then_some(new_e),
                    f,
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_split(
        &self,
        layer: &Layer,
        scanned: &ScannedRecord,
        start: Point2,
        end: Point2,
        e: f64,
        length: f64,
        piece_length: f64,
    ) -> MovePlan {
        let count = ((length / piece_length) - 1e-9).ceil().max(1.0) as usize;
        let original_feed = scanned.after.feed_rate;
        let mut pieces = Vec::with_capacity(count);
        let mut travelled = 0.0;

        for i in 0..count {
            let last = i + 1 == count;
            let next = if last {
                length
            } else {
                travelled + piece_length
            };
            let from = start.lerp(&end, travelled / length);
            let to = if last { end } else { start.lerp(&end, next / length) };
            let this_length = next - travelled;

            let distance = self.wall_distance(layer, &from.midpoint(&to));
            let flow = if self.in_untouched_core(distance) {
                1.0
            } else {
                self.config.flow_for(distance, length)
            };
            let piece_e = e * this_length / length * flow;
            let feed = self
                .plan_feed(original_feed, distance, this_length, piece_e)
                .or(original_feed);

            pieces.push(Piece {
                to,
                e: piece_e,
                feed,
            });
            travelled = next;
        }

        trace!(
            "Line {}: split {:.3} mm into {} pieces",
            scanned.record.line_number,
            length,
            count
        );
        MovePlan::Split(pieces)
    }
}
