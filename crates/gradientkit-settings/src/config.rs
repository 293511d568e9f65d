//! Settings for GradientKit
//!
//! Settings are read from TOML or JSON files and organized into sections:
//! - Gradient (thresholds, flows, speeds, sampling)
//! - Parsing (error policy, slicer dialect)
//! - Flow limit (hotend volumetric ceiling)
//! - Z gradient (layer-indexed flow override)
//! - Output (number formatting)

use gradientkit_engine::{
    DialectChoice, FlowLimit, GradientConfig, PipelineOptions, Sampling, ZGradient,
};
use gradientkit_gcode::{NumberFormat, ParsePolicy, SlicerDialect};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Largest number of decimals accepted for any output field
const MAX_PRECISION: usize = 10;

/// Wall distance sampling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// One sample per move
    #[default]
    Midpoint,
    /// Split long moves and sample each piece
    Subdivide,
}

/// Slicer selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlicerSetting {
    /// Detect from the file header
    #[default]
    Auto,
    Orca,
    Prusa,
    Bambu,
    Cura,
}

impl SlicerSetting {
    pub fn to_choice(self) -> DialectChoice {
        match self {
            Self::Auto => DialectChoice::Auto,
            Self::Orca => DialectChoice::Fixed(SlicerDialect::Orca),
            Self::Prusa => DialectChoice::Fixed(SlicerDialect::Prusa),
            Self::Bambu => DialectChoice::Fixed(SlicerDialect::Bambu),
            Self::Cura => DialectChoice::Fixed(SlicerDialect::Cura),
        }
    }
}

impl std::str::FromStr for SlicerSetting {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        Ok(match SlicerDialect::from_name(s)? {
            SlicerDialect::Orca => Self::Orca,
            SlicerDialect::Prusa => Self::Prusa,
            SlicerDialect::Bambu => Self::Bambu,
            SlicerDialect::Cura => Self::Cura,
        })
    }
}

/// Gradient settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientSettings {
    /// Wall distances in mm, ascending
    pub thresholds: Vec<f64>,
    /// Flow in percent at each threshold
    pub flows: Vec<f64>,
    /// Optional speed in percent at each threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speeds: Option<Vec<f64>>,
    /// Moves shorter than this (mm) use the nearest threshold's flow
    pub short_move_length: f64,
    /// Thin out infill beyond the largest threshold
    pub thin_inner_core: bool,
    pub sampling: SamplingMode,
    /// Piece length (mm) for subdivided sampling
    pub subdivision_length: f64,
}

impl Default for GradientSettings {
    fn default() -> Self {
        Self {
            thresholds: vec![0.0, 20.0],
            flows: vec![550.0, 50.0],
            speeds: None,
            short_move_length: 1.0,
            thin_inner_core: true,
            sampling: SamplingMode::Midpoint,
            subdivision_length: 5.0,
        }
    }
}

/// Parse settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseSettings {
    pub policy: ParsePolicy,
    pub slicer: SlicerSetting,
}

/// Hotend flow limit settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowLimitSettings {
    pub enabled: bool,
    /// mm³/s
    pub hotend_max_flow: f64,
    /// mm
    pub filament_diameter: f64,
}

impl Default for FlowLimitSettings {
    fn default() -> Self {
        let limit = FlowLimit::default();
        Self {
            enabled: false,
            hotend_max_flow: limit.hotend_max_flow,
            filament_diameter: limit.filament_diameter,
        }
    }
}

/// Z gradient settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZGradientSettings {
    pub enabled: bool,
    pub max_flow: f64,
    pub min_flow: f64,
    pub bottom_layers: usize,
    pub top_layers: usize,
    pub dense_to_light: bool,
    pub equalize_speed: bool,
}

impl Default for ZGradientSettings {
    fn default() -> Self {
        let z = ZGradient::default();
        Self {
            enabled: false,
            max_flow: z.max_flow,
            min_flow: z.min_flow,
            bottom_layers: z.bottom_layers,
            top_layers: z.top_layers,
            dense_to_light: z.dense_to_light,
            equalize_speed: z.equalize_speed,
        }
    }
}

/// Output formatting settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub e_precision: usize,
    pub f_precision: usize,
    pub xy_precision: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        let format = NumberFormat::default();
        Self {
            e_precision: format.e_precision,
            f_precision: format.f_precision,
            xy_precision: format.xy_precision,
        }
    }
}

/// Complete settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gradient: GradientSettings,
    pub parse: ParseSettings,
    pub flow_limit: FlowLimitSettings,
    pub z_gradient: ZGradientSettings,
    pub output: OutputSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

/// Parse a comma separated list of numbers such as `0,5,10`
pub fn parse_list(key: &str, value: &str) -> ConfigResult<Vec<f64>> {
    value
        .split(',')
        .map(|item| item.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::InvalidList {
            key: key.to_string(),
            value: value.to_string(),
        })
}

impl Settings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/gradientkit/settings.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("gradientkit").join("settings.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".to_string())
            })
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let settings: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        settings.validate()?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        for (key, value) in [
            ("output.e_precision", self.output.e_precision),
            ("output.f_precision", self.output.f_precision),
            ("output.xy_precision", self.output.xy_precision),
        ] {
            if value > MAX_PRECISION {
                return Err(ConfigError::ValueOutOfRange {
                    key: key.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }
        if let Some(speeds) = &self.gradient.speeds {
            if speeds.len() != self.gradient.thresholds.len() {
                return Err(SettingsError::InvalidSetting {
                    key: "gradient.speeds".to_string(),
                    reason: "must have one value per threshold".to_string(),
                });
            }
        }
        if self.gradient.flows.len() != self.gradient.thresholds.len() {
            return Err(SettingsError::InvalidSetting {
                key: "gradient.flows".to_string(),
                reason: "must have one value per threshold".to_string(),
            });
        }

        self.pipeline_options().map(|_| ())
    }

    /// Build the engine's gradient configuration
    pub fn gradient_config(&self) -> SettingsResult<GradientConfig> {
        let g = &self.gradient;
        let mut config = GradientConfig::new(g.thresholds.clone(), &g.flows)?
            .with_short_move_length(g.short_move_length)?
            .with_thin_inner_core(g.thin_inner_core);
        if let Some(speeds) = &g.speeds {
            config = config.with_speeds(speeds)?;
        }
        if g.sampling == SamplingMode::Subdivide {
            config = config.with_sampling(Sampling::Subdivide {
                length: g.subdivision_length,
            })?;
        }
        if self.flow_limit.enabled {
            config = config.with_flow_limit(FlowLimit {
                hotend_max_flow: self.flow_limit.hotend_max_flow,
                filament_diameter: self.flow_limit.filament_diameter,
            })?;
        }
        Ok(config)
    }

    /// Z gradient, if enabled
    pub fn z_gradient(&self) -> SettingsResult<Option<ZGradient>> {
        let z = &self.z_gradient;
        if !z.enabled {
            return Ok(None);
        }
        let gradient = ZGradient {
            max_flow: z.max_flow,
            min_flow: z.min_flow,
            bottom_layers: z.bottom_layers,
            top_layers: z.top_layers,
            dense_to_light: z.dense_to_light,
            equalize_speed: z.equalize_speed,
        };
        gradient.validate()?;
        Ok(Some(gradient))
    }

    /// Everything the pipeline needs for one run
    pub fn pipeline_options(&self) -> SettingsResult<PipelineOptions> {
        Ok(PipelineOptions {
            dialect: self.parse.slicer.to_choice(),
            policy: self.parse.policy,
            gradient: self.gradient_config()?,
            z_gradient: self.z_gradient()?,
            format: NumberFormat {
                e_precision: self.output.e_precision,
                f_precision: self.output.f_precision,
                xy_precision: self.output.xy_precision,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::new();
        assert!(settings.validate().is_ok());
        let options = settings.pipeline_options().unwrap();
        assert_eq!(options.dialect, DialectChoice::Auto);
        assert_eq!(options.gradient.flows(), &[5.5, 0.5]);
        assert!(options.z_gradient.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [gradient]
            thresholds = [0.0, 5.0, 10.0]
            flows = [200.0, 100.0, 60.0]

            [parse]
            policy = "lenient"
            slicer = "prusa"
            "#,
        )
        .unwrap();
        assert_eq!(settings.gradient.short_move_length, 1.0);
        assert_eq!(settings.parse.policy, ParsePolicy::Lenient);
        assert_eq!(
            settings.parse.slicer.to_choice(),
            DialectChoice::Fixed(SlicerDialect::Prusa)
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_mismatched_flows_rejected() {
        let mut settings = Settings::new();
        settings.gradient.flows = vec![100.0];
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_descending_thresholds_rejected() {
        let mut settings = Settings::new();
        settings.gradient.thresholds = vec![10.0, 0.0];
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Gradient(_))
        ));
    }

    #[test]
    fn test_precision_out_of_range() {
        let mut settings = Settings::new();
        settings.output.e_precision = 12;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_subdivide_and_flow_limit_reach_engine() {
        let mut settings = Settings::new();
        settings.gradient.sampling = SamplingMode::Subdivide;
        settings.gradient.subdivision_length = 2.5;
        settings.flow_limit.enabled = true;
        let config = settings.gradient_config().unwrap();
        assert_eq!(config.sampling(), Sampling::Subdivide { length: 2.5 });
        assert_eq!(config.flow_limit(), Some(&FlowLimit::default()));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("flows", "100, 50").unwrap(), vec![100.0, 50.0]);
        assert!(matches!(
            parse_list("flows", "100,abc"),
            Err(ConfigError::InvalidList { .. })
        ));
    }

    #[test]
    fn test_slicer_from_str() {
        assert_eq!("AUTO".parse::<SlicerSetting>().unwrap(), SlicerSetting::Auto);
        assert_eq!("cura".parse::<SlicerSetting>().unwrap(), SlicerSetting::Cura);
        assert!("ideamaker".parse::<SlicerSetting>().is_err());
    }
}
