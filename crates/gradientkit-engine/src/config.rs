//! Gradient configuration
//!
//! Immutable parameters for one rewrite run. Flow and speed values are stored
//! as multipliers (percent / 100) and looked up by wall distance.

use gradientkit_core::GradientError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// How the wall distance of an infill move is sampled
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Sampling {
    /// One sample at the move's midpoint
    #[default]
    Midpoint,
    /// Split long moves into pieces of `length` and sample each piece's midpoint
    Subdivide { length: f64 },
}

/// Hotend volumetric flow ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowLimit {
    /// mm³/s
    pub hotend_max_flow: f64,
    /// mm
    pub filament_diameter: f64,
}

impl Default for FlowLimit {
    fn default() -> Self {
        Self {
            hotend_max_flow: 20.0,
            filament_diameter: 1.75,
        }
    }
}

impl FlowLimit {
    /// Filament cross-section area in mm²
    pub fn filament_area(&self) -> f64 {
        PI * self.filament_diameter * self.filament_diameter / 4.0
    }

    /// Volumetric flow in mm³/s of a move extruding `e` mm of filament over `length` mm at `feed` mm/min
    pub fn volumetric_flow(&self, feed: f64, e: f64, length: f64) -> f64 {
        (feed / 60.0) * (e / length) * self.filament_area()
    }

    /// Feed rate lowered so the move stays within the ceiling
    ///
    /// Returns `None` when the move is already within the limit.
    pub fn cap_feed(&self, feed: f64, e: f64, length: f64) -> Option<f64> {
        if e <= 0.0 || length <= 0.0 {
            return None;
        }
        if self.volumetric_flow(feed, e, length) <= self.hotend_max_flow {
            return None;
        }
        Some(self.hotend_max_flow * length * 60.0 / (e * self.filament_area()))
    }
}

/// Distance thresholds and the flow (and optional speed) at each of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    thresholds: Vec<f64>,
    flows: Vec<f64>,
    speeds: Option<Vec<f64>>,
    short_move_length: f64,
    thin_inner_core: bool,
    sampling: Sampling,
    flow_limit: Option<FlowLimit>,
}

fn invalid(reason: impl Into<String>) -> GradientError {
    GradientError::InvalidConfig {
        reason: reason.into(),
    }
}

fn percentages(name: &str, values: &[f64], expected: usize) -> Result<Vec<f64>, GradientError> {
    if values.len() != expected {
        return Err(invalid(format!(
            "{} has {} values but there are {} thresholds",
            name,
            values.len(),
            expected
        )));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(invalid(format!("{} value {} must be a non-negative percentage", name, bad)));
    }
    Ok(values.iter().map(|v| v / 100.0).collect())
}

impl GradientConfig {
    /// Create a configuration from thresholds (mm, ascending) and flows (percent)
    pub fn new(thresholds: Vec<f64>, flow_percents: &[f64]) -> Result<Self, GradientError> {
        if thresholds.is_empty() {
            return Err(invalid("at least one distance threshold is required"));
        }
        if let Some(bad) = thresholds.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(invalid(format!("threshold {} must be a non-negative distance", bad)));
        }
        if thresholds.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(invalid("thresholds must be strictly ascending"));
        }
        let flows = percentages("flows", flow_percents, thresholds.len())?;

        Ok(Self {
            thresholds,
            flows,
            speeds: None,
            short_move_length: 0.0,
            thin_inner_core: true,
            sampling: Sampling::Midpoint,
            flow_limit: None,
        })
    }

    /// Pair a speed percentage with every threshold
    pub fn with_speeds(mut self, speed_percents: &[f64]) -> Result<Self, GradientError> {
        self.speeds = Some(percentages("speeds", speed_percents, self.thresholds.len())?);
        Ok(self)
    }

    pub fn with_short_move_length(mut self, length: f64) -> Result<Self, GradientError> {
        if !length.is_finite() || length < 0.0 {
            return Err(invalid(format!("short move length {} must be non-negative", length)));
        }
        self.short_move_length = length;
        Ok(self)
    }

    pub fn with_thin_inner_core(mut self, enabled: bool) -> Self {
        self.thin_inner_core = enabled;
        self
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Result<Self, GradientError> {
        if let Sampling::Subdivide { length } = sampling {
            if !length.is_finite() || length <= 0.0 {
                return Err(invalid(format!("subdivision length {} must be positive", length)));
            }
        }
        self.sampling = sampling;
        Ok(self)
    }

    pub fn with_flow_limit(mut self, limit: FlowLimit) -> Result<Self, GradientError> {
        if !(limit.hotend_max_flow > 0.0 && limit.hotend_max_flow.is_finite()) {
            return Err(invalid("hotend max flow must be positive"));
        }
        if !(limit.filament_diameter > 0.0 && limit.filament_diameter.is_finite()) {
            return Err(invalid("filament diameter must be positive"));
        }
        self.flow_limit = Some(limit);
        Ok(self)
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Flow multipliers, one per threshold
    pub fn flows(&self) -> &[f64] {
        &self.flows
    }

    pub fn speeds(&self) -> Option<&[f64]> {
        self.speeds.as_deref()
    }

    pub fn short_move_length(&self) -> f64 {
        self.short_move_length
    }

    pub fn thin_inner_core(&self) -> bool {
        self.thin_inner_core
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    pub fn flow_limit(&self) -> Option<&FlowLimit> {
        self.flow_limit.as_ref()
    }

    /// Largest configured threshold
    pub fn max_threshold(&self) -> f64 {
        self.thresholds.last().copied().unwrap_or(0.0)
    }

    /// Index of the threshold closest to `distance`, ties go to the lower index
    pub fn nearest_threshold_index(&self, distance: f64) -> usize {
        let mut best = 0;
        for (i, t) in self.thresholds.iter().enumerate().skip(1) {
            if (t - distance).abs() < (self.thresholds[best] - distance).abs() {
                best = i;
            }
        }
        best
    }

    /// Piecewise-linear lookup of `values` at `distance`, clamped at both ends
    fn interpolate(&self, values: &[f64], distance: f64) -> f64 {
        let last = self.thresholds.len() - 1;
        if distance <= self.thresholds[0] {
            return values[0];
        }
        if distance >= self.thresholds[last] {
            return values[last];
        }
        let upper = self.thresholds.partition_point(|t| *t <= distance);
        let (t0, t1) = (self.thresholds[upper - 1], self.thresholds[upper]);
        let fraction = (distance - t0) / (t1 - t0);
        values[upper - 1] + fraction * (values[upper] - values[upper - 1])
    }

    /// Interpolated flow multiplier at `distance`
    pub fn flow_at(&self, distance: f64) -> f64 {
        self.interpolate(&self.flows, distance)
    }

    /// Interpolated speed multiplier at `distance`, if speeds are configured
    pub fn speed_at(&self, distance: f64) -> Option<f64> {
        self.speeds
            .as_deref()
            .map(|speeds| self.interpolate(speeds, distance))
    }

    /// Flow multiplier for a move of `length` whose sample lies `distance` from the walls
    ///
    /// Moves shorter than the short-move length take the nearest threshold's
    /// flow instead of an interpolated one.
    pub fn flow_for(&self, distance: f64, length: f64) -> f64 {
        if length < self.short_move_length {
            self.flows[self.nearest_threshold_index(distance)]
        } else {
            self.flow_at(distance)
        }
    }

    /// Speed multiplier counterpart of [`GradientConfig::flow_for`]
    pub fn speed_for(&self, distance: f64, length: f64) -> Option<f64> {
        let speeds = self.speeds.as_deref()?;
        if length < self.short_move_length {
            Some(speeds[self.nearest_threshold_index(distance)])
        } else {
            Some(self.interpolate(speeds, distance))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point() -> GradientConfig {
        GradientConfig::new(vec![0.0, 10.0], &[100.0, 50.0]).unwrap()
    }

    #[test]
    fn test_interpolates_between_thresholds() {
        let config = two_point();
        assert!((config.flow_at(5.0) - 0.75).abs() < 1e-12);
        assert!((config.flow_at(2.5) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_clamps_outside_range() {
        let config = two_point();
        assert_eq!(config.flow_at(-1.0), 1.0);
        assert_eq!(config.flow_at(0.0), 1.0);
        assert_eq!(config.flow_at(10.0), 0.5);
        assert_eq!(config.flow_at(250.0), 0.5);
    }

    #[test]
    fn test_multi_segment_lookup() {
        let config = GradientConfig::new(vec![1.0, 2.0, 6.0], &[200.0, 150.0, 50.0]).unwrap();
        assert!((config.flow_at(1.5) - 1.75).abs() < 1e-12);
        assert!((config.flow_at(2.0) - 1.5).abs() < 1e-12);
        assert!((config.flow_at(4.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_move_uses_nearest_threshold() {
        let config = two_point().with_short_move_length(1.0).unwrap();
        // Interpolation would give 0.85
        assert_eq!(config.flow_for(3.0, 0.5), 1.0);
        assert_eq!(config.flow_for(7.0, 0.5), 0.5);
        assert!((config.flow_for(3.0, 2.0) - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_threshold_tie_goes_low() {
        assert_eq!(two_point().nearest_threshold_index(5.0), 0);
    }

    #[test]
    fn test_speeds() {
        let config = two_point().with_speeds(&[100.0, 200.0]).unwrap();
        assert_eq!(config.speed_at(10.0), Some(2.0));
        assert_eq!(two_point().speed_at(10.0), None);
        assert!(two_point().with_speeds(&[100.0]).is_err());
    }

    #[test]
    fn test_validation() {
        assert!(GradientConfig::new(vec![], &[]).is_err());
        assert!(GradientConfig::new(vec![5.0, 1.0], &[100.0, 50.0]).is_err());
        assert!(GradientConfig::new(vec![1.0, 1.0], &[100.0, 50.0]).is_err());
        assert!(GradientConfig::new(vec![1.0, 2.0], &[100.0]).is_err());
        assert!(GradientConfig::new(vec![1.0], &[-5.0]).is_err());
        assert!(two_point().with_short_move_length(-1.0).is_err());
        assert!(two_point()
            .with_sampling(Sampling::Subdivide { length: 0.0 })
            .is_err());
    }

    #[test]
    fn test_flow_limit_caps_feed() {
        let limit = FlowLimit {
            hotend_max_flow: 10.0,
            filament_diameter: 1.75,
        };
        // 0.1 mm filament per mm at 6000 mm/min is about 24 mm³/s
        let capped = limit.cap_feed(6000.0, 1.0, 10.0).unwrap();
        assert!((limit.volumetric_flow(capped, 1.0, 10.0) - 10.0).abs() < 1e-9);
        assert_eq!(limit.cap_feed(600.0, 1.0, 10.0), None);
    }
}
