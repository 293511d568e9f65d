//! Z gradient
//!
//! Varies infill flow with height by injecting flow-override commands after
//! type markers. Infill gets `M221 S<factor>`; every other region is reset to
//! 100%.

use gradientkit_core::GradientError;
use gradientkit_gcode::Region;
use serde::{Deserialize, Serialize};

/// Layer-indexed flow override for infill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZGradient {
    /// Percent
    pub max_flow: f64,
    /// Percent
    pub min_flow: f64,
    /// Layers at the bottom that keep the starting factor
    pub bottom_layers: usize,
    /// Layers at the top that keep the final factor
    pub top_layers: usize,
    /// Start at `max_flow` and end at `min_flow`
    pub dense_to_light: bool,
    /// Slow down with `M220` while the factor is above 100%
    pub equalize_speed: bool,
}

impl Default for ZGradient {
    fn default() -> Self {
        Self {
            max_flow: 220.0,
            min_flow: 60.0,
            bottom_layers: 4,
            top_layers: 4,
            dense_to_light: true,
            equalize_speed: true,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl ZGradient {
    pub fn validate(&self) -> Result<(), GradientError> {
        for (name, value) in [("max_flow", self.max_flow), ("min_flow", self.min_flow)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(GradientError::InvalidConfig {
                    reason: format!("z gradient {} must be a positive percentage", name),
                });
            }
        }
        Ok(())
    }

    /// Flow factor in percent for the 1-based `layer` out of `total_layers`
    ///
    /// The first layer above the bottom band gets the starting factor and the
    /// last layer below the top band gets the final one.
    pub fn factor(&self, layer: usize, total_layers: usize) -> f64 {
        let span = total_layers.saturating_sub(self.bottom_layers + self.top_layers);
        let t = if span <= 1 {
            0.0
        } else {
            let progressed = layer as f64 - self.bottom_layers as f64 - 1.0;
            (progressed / (span - 1) as f64).clamp(0.0, 1.0)
        };
        let (start, end) = if self.dense_to_light {
            (self.max_flow, self.min_flow)
        } else {
            (self.min_flow, self.max_flow)
        };
        round2((1.0 - t) * start + t * end)
    }

    /// Lines to inject after a type marker announcing `region`
    pub fn lines_after_marker(&self, region: Region, layer: usize, total_layers: usize) -> Vec<String> {
        if region != Region::Infill {
            let mut lines = vec!["M221 S100".to_string()];
            if self.equalize_speed {
                lines.push("M220 S100".to_string());
            }
            return lines;
        }

        let factor = self.factor(layer, total_layers);
        let mut lines = vec![format!("M221 S{}", factor)];
        if self.equalize_speed && factor > 100.0 {
            lines.push(format!("M220 S{}", round2(10000.0 / factor)));
        }
        lines
    }
}
