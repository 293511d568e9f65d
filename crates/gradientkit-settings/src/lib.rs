//! GradientKit Settings Crate
//!
//! Handles settings files, validation and conversion into engine options.

pub mod config;
pub mod error;

pub use config::{
    parse_list, FlowLimitSettings, GradientSettings, OutputSettings, ParseSettings, SamplingMode,
    Settings, SlicerSetting, ZGradientSettings,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
