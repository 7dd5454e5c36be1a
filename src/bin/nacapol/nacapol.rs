mod config;
mod plot;
mod tests;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use config::{FileConfig, Settings};
use foxil::result::{AnalysisResult, Polar};
use foxil::{FoxConfig, Xfoil};
use log::info;
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Sweep NACA airfoils through XFoil and plot their polars",
    long_about = "Runs XFoil for each NACA 4-digit airfoil over a range of angles of attack, parses the polar and the paneled coordinates, and renders shape, Cl, Cd, Cm and Cl/Cd plots."
)]
pub struct Cli {
    /// Path to the XFoil executable. Defaults to xfoil next to this program.
    #[arg(short = 'x', long, env = "XFOIL_PATH")]
    pub xfoil_path: Option<PathBuf>,

    /// Polar file XFoil accumulates into. Reused for every airfoil.
    #[arg(short = 'p', long, env = "XFOIL_POLAR_PATH")]
    pub polar_path: Option<PathBuf>,

    /// NACA airfoil designations, comma separated (e.g., "2412,0012").
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub naca: Vec<String>,

    /// Reynolds number.
    #[arg(short, long)]
    pub reynolds: Option<f64>,

    /// Mach number.
    #[arg(short, long)]
    pub mach: Option<f64>,

    /// Viscous iteration limit per angle.
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Minimum angle of attack (degrees).
    #[arg(long, allow_negative_numbers = true)]
    pub min_aoa: Option<f64>,

    /// Maximum angle of attack (degrees), inclusive.
    #[arg(long, allow_negative_numbers = true)]
    pub max_aoa: Option<f64>,

    /// Angle of attack step (degrees).
    #[arg(long)]
    pub aoa_step: Option<f64>,

    /// Directory for figures and CSV files.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Render SVG instead of PNG.
    #[arg(long, default_value_t = false)]
    pub svg: bool,

    /// Also write each polar to a CSV file.
    #[arg(long, default_value_t = false)]
    pub csv: bool,

    /// Write the best L/D point of every airfoil to this JSON file.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Open each figure in the system image viewer.
    #[arg(long, default_value_t = false)]
    pub show: bool,

    /// Optional TOML file providing defaults for the options above.
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,
}

/// Run the polar sweep for one airfoil. `None` means XFoil is missing.
fn analyze_polar(settings: &Settings, naca: &str) -> Result<Option<Polar>> {
    FoxConfig::new(&settings.xfoil_path)
        .naca(naca)
        .angles(settings.angles())
        .reynolds(settings.reynolds)
        .mach(settings.mach)
        .iterations(settings.iterations)
        .polar_accumulation(&settings.polar_path)
        .get_runner()?
        .dispatch()
        .with_context(|| format!("XFoil polar run failed for NACA {}", naca))
}

/// Analyze every airfoil in order and return the best L/D point of each.
pub fn run(settings: &Settings) -> Result<BTreeMap<String, AnalysisResult>> {
    create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;

    let xfoil = Xfoil::new(&settings.xfoil_path);
    let pb = utils::setup_progress_bar(settings.airfoils.len() as u64, "Analyzing");
    let mut best = BTreeMap::new();

    for naca in &settings.airfoils {
        pb.set_message(format!("NACA {}", naca));
        info!("Analyzing NACA {}...", naca);

        let Some(polar) = analyze_polar(settings, naca)? else {
            pb.inc(1);
            continue;
        };
        let coords = xfoil
            .coordinates(naca)
            .with_context(|| format!("failed to read coordinates of NACA {}", naca))?;

        if let Some(figure) =
            plot::plot_airfoil_and_polar(&coords, &polar, naca, &settings.figure_path(naca))?
        {
            info!("Figure written to {}", figure.display());
            if settings.show {
                utils::open_in_viewer(&figure);
            }
        }

        if settings.csv && !polar.is_empty() {
            let path = settings.csv_path(naca);
            polar.to_csv(&path)?;
            info!("Polar written to {}", path.display());
        }

        if let Some(result) = polar.best_ratio() {
            pb.suspend(|| utils::display_analysis_summary(naca, settings.reynolds, &result));
            best.insert(naca.clone(), result);
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    if let Some(path) = &settings.summary {
        let file = File::create(path)
            .with_context(|| format!("failed to create summary file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &best)?;
        info!("Summary written to {}", path.display());
    }
    Ok(best)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&cli, file_config)?;
    run(&settings)?;
    Ok(())
}
