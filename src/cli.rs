//! Command line interface
//!
//! `gradientkit <INPUT>` rewrites the file in place, the way slicers run
//! post-processing scripts. The whole file is processed before anything is
//! written, so a failed run leaves the input untouched.

use anyhow::Context;
use clap::Parser;
use gradientkit_engine::{process, RewriteReport};
use gradientkit_gcode::ParsePolicy;
use gradientkit_settings::{parse_list, SamplingMode, Settings, SlicerSetting};
use std::path::PathBuf;
use tracing::{debug, info};

/// GradientKit - gradient infill post-processor for FDM G-code
#[derive(Parser, Debug)]
#[command(name = "gradientkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// G-code file to rewrite
    pub input: PathBuf,

    /// Write the result here instead of rewriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Settings file (.toml or .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Wall distance thresholds in mm, comma separated
    #[arg(long, value_name = "MM,..")]
    pub thresholds: Option<String>,

    /// Flow percentage at each threshold, comma separated
    #[arg(long, value_name = "PERCENT,..")]
    pub flows: Option<String>,

    /// Speed percentage at each threshold, comma separated
    #[arg(long, value_name = "PERCENT,..")]
    pub speeds: Option<String>,

    /// Moves shorter than this use the nearest threshold's flow
    #[arg(long, value_name = "MM")]
    pub short_move: Option<f64>,

    /// Keep malformed lines verbatim instead of aborting
    #[arg(long)]
    pub lenient: bool,

    /// Slicer dialect: auto, orca, prusa, bambu or cura
    #[arg(long)]
    pub slicer: Option<String>,

    /// Split long infill moves into pieces of this length
    #[arg(long, value_name = "MM")]
    pub subdivide: Option<f64>,

    /// Leave infill beyond the largest threshold unmodified
    #[arg(long)]
    pub no_thin_core: bool,

    /// Cap feed rates to this hotend volumetric flow
    #[arg(long, value_name = "MM3_PER_S")]
    pub max_flow_limit: Option<f64>,

    /// Process and report without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Settings from the config file (explicit or default location) with flag overrides applied
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => match Settings::default_path() {
                Ok(path) if path.exists() => {
                    debug!("Using settings from {}", path.display());
                    Settings::load_from_file(&path)
                        .with_context(|| format!("Failed to load settings from {}", path.display()))?
                }
                _ => Settings::new(),
            },
        };

        let gradient = &mut settings.gradient;
        if let Some(value) = &self.thresholds {
            gradient.thresholds = parse_list("thresholds", value)?;
        }
        if let Some(value) = &self.flows {
            gradient.flows = parse_list("flows", value)?;
        }
        if let Some(value) = &self.speeds {
            gradient.speeds = Some(parse_list("speeds", value)?);
        }
        if let Some(length) = self.short_move {
            gradient.short_move_length = length;
        }
        if let Some(length) = self.subdivide {
            gradient.sampling = SamplingMode::Subdivide;
            gradient.subdivision_length = length;
        }
        if self.no_thin_core {
            gradient.thin_inner_core = false;
        }
        if self.lenient {
            settings.parse.policy = ParsePolicy::Lenient;
        }
        if let Some(name) = &self.slicer {
            settings.parse.slicer = name.parse::<SlicerSetting>()?;
        }
        if let Some(limit) = self.max_flow_limit {
            settings.flow_limit.enabled = true;
            settings.flow_limit.hotend_max_flow = limit;
        }

        settings.validate()?;
        Ok(settings)
    }
}

/// Process the input file and write the result
pub fn run(cli: &Cli) -> anyhow::Result<RewriteReport> {
    let settings = cli.settings()?;
    let options = settings.pipeline_options()?;

    let input = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let output = process(&input, &options)
        .with_context(|| format!("Failed to process {}", cli.input.display()))?;

    if cli.dry_run {
        info!("Dry run, nothing written");
    } else {
        let target = cli.output.as_ref().unwrap_or(&cli.input);
        std::fs::write(target, &output.text)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        info!("Wrote {}", target.display());
    }

    Ok(output.report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_overrides() {
        let cli = Cli::parse_from([
            "gradientkit",
            "part.gcode",
            "--thresholds",
            "0,5,10",
            "--flows",
            "200,100,50",
            "--lenient",
            "--slicer",
            "prusa",
            "--subdivide",
            "2",
            "--no-thin-core",
            "--max-flow-limit",
            "15",
        ]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.gradient.thresholds, vec![0.0, 5.0, 10.0]);
        assert_eq!(settings.gradient.sampling, SamplingMode::Subdivide);
        assert!(!settings.gradient.thin_inner_core);
        assert_eq!(settings.parse.policy, ParsePolicy::Lenient);
        assert_eq!(settings.parse.slicer, SlicerSetting::Prusa);
        assert!(settings.flow_limit.enabled);
        assert_eq!(settings.flow_limit.hotend_max_flow, 15.0);
    }

    #[test]
    fn test_inconsistent_flags_rejected() {
        let cli = Cli::parse_from(["gradientkit", "part.gcode", "--thresholds", "0,5,10"]);
        assert!(cli.settings().is_err());

        let cli = Cli::parse_from(["gradientkit", "part.gcode", "--slicer", "makerbot"]);
        assert!(cli.settings().is_err());
    }
}
