//! Layer segmentation
//!
//! Groups the record stream into layers in a single forward pass, tags every
//! record with the region announced by the last type marker, and collects the
//! layer's wall polylines once the whole layer has been scanned.

use gradientkit_core::WallSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{PrintState, Record, RecordKind, Region};

/// A record together with the cursor around it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedRecord {
    pub record: Record,
    pub region: Region,
    /// Cursor before the record executes
    pub before: PrintState,
    /// Cursor after the record executes
    pub after: PrintState,
}

impl ScannedRecord {
    /// Whether this is a forward extrusion that changes XY position
    pub fn is_extruding_xy_move(&self) -> bool {
        self.record
            .as_move()
            .is_some_and(|mv| mv.is_extruding() && mv.moves_xy())
    }

    /// Planar length of the move
    pub fn xy_length(&self) -> f64 {
        self.before
            .position
            .xy()
            .distance_to(&self.after.position.xy())
    }
}

/// Records between two layer-change markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// 0-based, in file order
    pub index: usize,
    /// False only for the leading block before the first layer marker
    pub has_marker: bool,
    pub records: Vec<ScannedRecord>,
    /// Walls printed in this layer, complete once the layer is built
    pub walls: WallSet,
}

impl Layer {
    fn open(index: usize, has_marker: bool) -> Self {
        Self {
            index,
            has_marker,
            records: Vec::new(),
            walls: WallSet::new(),
        }
    }

    /// Number of extruding infill moves
    pub fn infill_move_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.region == Region::Infill && r.is_extruding_xy_move())
            .count()
    }
}

/// Splits a record stream into layers
#[derive(Debug, Clone, Default)]
pub struct LayerSegmenter;

impl LayerSegmenter {
    /// Create a segmenter starting from an empty cursor
    pub fn new() -> Self {
        Self
    }

    /// Group `records` into layers
    ///
    /// A layer marker belongs to the layer it opens. Records before the first
    /// type marker of a layer are tagged [`Region::Unknown`].
    pub fn segment(&self, records: Vec<Record>) -> Vec<Layer> {
        let mut layers = Vec::new();
        let mut current: Option<Layer> = None;
        let mut region = Region::Unknown;
        let mut state = PrintState::new();

        for record in records {
            if record.is_layer_change() {
                if let Some(done) = current.take() {
                    layers.push(Self::finish(done));
                }
                current = Some(Layer::open(layers.len(), true));
                region = Region::Unknown;
            }
            if let RecordKind::TypeChange(next) = record.kind {
                region = next;
            }

            let layer = current.get_or_insert_with(|| Layer::open(layers.len(), false));
            let after = state.advance(&record);
            layer.records.push(ScannedRecord {
                record,
                region,
                before: state,
                after,
            });
            state = after;
        }

        if let Some(done) = current.take() {
            layers.push(Self::finish(done));
        }
        debug!("Segmented stream into {} layers", layers.len());
        layers
    }

    fn finish(mut layer: Layer) -> Layer {
        let mut walls = WallSet::new();
        for scanned in &layer.records {
            if scanned.region == Region::Wall && scanned.is_extruding_xy_move() {
                walls.add_move(scanned.before.position.xy(), scanned.after.position.xy());
            }
        }
        trace!(
            "Layer {}: {} records, {} wall segments",
            layer.index,
            layer.records.len(),
            walls.segment_count()
        );
        layer.walls = walls;
        layer
    }
}
