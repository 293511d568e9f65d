//! Slicer comment dialects
//!
//! Every slicer annotates its output with its own comment conventions for
//! layer changes and feature types. A [`MarkerRecognizer`] turns one comment
//! line into a [`Marker`]; the rest of the pipeline only ever sees markers.

use gradientkit_core::GradientError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::Region;

/// What a comment line means to the layer segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    LayerChange,
    TypeChange(Region),
    None,
}

/// Classifies slicer comment lines
pub trait MarkerRecognizer: Send + Sync {
    /// Get the name/identifier of this recognizer
    fn name(&self) -> &str;

    /// Classify a single line (without its terminator)
    fn classify(&self, line: &str) -> Marker;
}

/// Arc-wrapped recognizer for thread-safe sharing
pub type RecognizerHandle = Arc<dyn MarkerRecognizer>;

/// Region for the feature names shared by OrcaSlicer and BambuStudio
fn orca_feature_region(feature: &str) -> Region {
    match feature {
        "Inner wall" | "Outer wall" | "Overhang wall" => Region::Wall,
        "Sparse infill" => Region::Infill,
        "Internal solid infill" | "Top surface" | "Bottom surface" | "Bridge"
        | "Internal Bridge" => Region::Skin,
        "Support" | "Support interface" | "Support transition" => Region::Support,
        _ => Region::Other,
    }
}

/// OrcaSlicer: `;LAYER_CHANGE` and `;TYPE:<feature>`
#[derive(Debug, Clone, Default)]
pub struct OrcaRecognizer;

impl MarkerRecognizer for OrcaRecognizer {
    fn name(&self) -> &str {
        "orca"
    }

    fn classify(&self, line: &str) -> Marker {
        if line.starts_with(";LAYER_CHANGE") {
            Marker::LayerChange
        } else if let Some(feature) = line.strip_prefix(";TYPE:") {
            Marker::TypeChange(orca_feature_region(feature.trim()))
        } else {
            Marker::None
        }
    }
}

/// BambuStudio: `; CHANGE_LAYER` and `; FEATURE: <feature>`
#[derive(Debug, Clone, Default)]
pub struct BambuRecognizer;

impl MarkerRecognizer for BambuRecognizer {
    fn name(&self) -> &str {
        "bambu"
    }

    fn classify(&self, line: &str) -> Marker {
        if line.starts_with("; CHANGE_LAYER") {
            Marker::LayerChange
        } else if let Some(feature) = line.strip_prefix("; FEATURE:") {
            Marker::TypeChange(orca_feature_region(feature.trim()))
        } else {
            Marker::None
        }
    }
}

/// PrusaSlicer: `;LAYER_CHANGE` and `;TYPE:<role>`
#[derive(Debug, Clone, Default)]
pub struct PrusaRecognizer;

impl MarkerRecognizer for PrusaRecognizer {
    fn name(&self) -> &str {
        "prusa"
    }

    fn classify(&self, line: &str) -> Marker {
        if line.starts_with(";LAYER_CHANGE") {
            return Marker::LayerChange;
        }
        let Some(role) = line.strip_prefix(";TYPE:") else {
            return Marker::None;
        };
        let region = match role.trim() {
            "Perimeter" | "External perimeter" | "Overhang perimeter" => Region::Wall,
            "Internal infill" => Region::Infill,
            "Solid infill" | "Top solid infill" | "Bridge infill" => Region::Skin,
            "Support material" | "Support material interface" => Region::Support,
            _ => Region::Other,
        };
        Marker::TypeChange(region)
    }
}

/// Cura: `;LAYER:<n>` and `;TYPE:<TYPE>`
#[derive(Debug, Clone, Default)]
pub struct CuraRecognizer;

impl MarkerRecognizer for CuraRecognizer {
    fn name(&self) -> &str {
        "cura"
    }

    fn classify(&self, line: &str) -> Marker {
        if line.starts_with(";LAYER:") {
            return Marker::LayerChange;
        }
        let Some(kind) = line.strip_prefix(";TYPE:") else {
            return Marker::None;
        };
        let region = match kind.trim() {
            "WALL-INNER" | "WALL-OUTER" => Region::Wall,
            "FILL" => Region::Infill,
            "SKIN" => Region::Skin,
            "SUPPORT" | "SUPPORT-INTERFACE" => Region::Support,
            _ => Region::Other,
        };
        Marker::TypeChange(region)
    }
}

/// Supported slicers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlicerDialect {
    Orca,
    Prusa,
    Bambu,
    Cura,
}

impl SlicerDialect {
    /// All dialects, in detection order
    pub const ALL: [SlicerDialect; 4] = [
        SlicerDialect::Orca,
        SlicerDialect::Prusa,
        SlicerDialect::Bambu,
        SlicerDialect::Cura,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Orca => "orca",
            Self::Prusa => "prusa",
            Self::Bambu => "bambu",
            Self::Cura => "cura",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, GradientError> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| GradientError::UnknownDialect {
                name: name.to_string(),
            })
    }

    pub fn recognizer(&self) -> RecognizerHandle {
        match self {
            Self::Orca => Arc::new(OrcaRecognizer),
            Self::Prusa => Arc::new(PrusaRecognizer),
            Self::Bambu => Arc::new(BambuRecognizer),
            Self::Cura => Arc::new(CuraRecognizer),
        }
    }

    /// Detect the slicer from the signature comments it writes
    ///
    /// OrcaSlicer writes BambuStudio-style feature comments when it targets a
    /// Bambu printer, which it records in its trailing config block.
    pub fn detect<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut detected = None;
        for line in lines {
            match detected {
                None => {
                    if line.starts_with("; generated by PrusaSlicer") {
                        return Some(Self::Prusa);
                    } else if line.starts_with("; BambuStudio") {
                        return Some(Self::Bambu);
                    } else if line.starts_with(";Generated with Cura_SteamEngine") {
                        return Some(Self::Cura);
                    } else if line.starts_with("; generated by OrcaSlicer") {
                        detected = Some(Self::Orca);
                    }
                }
                Some(Self::Orca) => {
                    if line.starts_with("; printer_model = Bambu") {
                        return Some(Self::Bambu);
                    }
                }
                Some(_) => break,
            }
        }
        detected
    }
}

impl std::fmt::Display for SlicerDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Registry of recognizer factories by name
pub struct RecognizerRegistry {
    factories: HashMap<String, Arc<dyn Fn() -> RecognizerHandle + Send + Sync>>,
}

impl RecognizerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in dialect
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for dialect in SlicerDialect::ALL {
            registry.register(dialect.name(), move || dialect.recognizer());
        }
        registry
    }

    /// Register a recognizer factory
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> RecognizerHandle + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Create a recognizer by name
    pub fn create(&self, name: &str) -> Option<RecognizerHandle> {
        self.factories.get(name).map(|f| f())
    }

    /// List all registered recognizer names
    pub fn list_registered(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for RecognizerRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
