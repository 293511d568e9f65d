use clap::Parser;
use gradientkit::cli::{run, Cli};
use gradientkit::{init_logging, BUILD_DATE, VERSION};
use tracing::{debug, warn};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    debug!("GradientKit v{} (built {})", VERSION, BUILD_DATE);

    let report = run(&cli)?;
    if report.has_diagnostics() {
        warn!("{} diagnostics, rerun with --verbose for details", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            debug!("{}", diagnostic);
        }
    }

    Ok(())
}
