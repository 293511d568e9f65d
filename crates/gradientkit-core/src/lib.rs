//! # GradientKit Core
//!
//! Core types shared by every GradientKit crate: the error taxonomy used
//! across parsing, segmentation and flow rewriting, and the 2D geometry
//! primitives used to measure how far an infill move lies from the walls.

pub mod error;
pub mod geometry;

pub use error::{Error, GcodeError, GradientError, Result};
pub use geometry::{Point2, Polyline, Segment, WallSet, COINCIDENT_EPSILON};
