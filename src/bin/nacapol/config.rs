use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shellexpand::tilde;
use std::fs::read_to_string;
use std::path::PathBuf;

use crate::utils::{default_xfoil_path, validate_naca};
use crate::Cli;

pub const DEFAULT_AIRFOILS: [&str; 3] = ["2412", "0012", "4412"];
pub const DEFAULT_REYNOLDS: f64 = 1e6;
pub const DEFAULT_MACH: f64 = 0.0;
pub const DEFAULT_ITERATIONS: usize = 100;
pub const DEFAULT_MIN_AOA: f64 = 0.0;
pub const DEFAULT_MAX_AOA: f64 = 14.0;
pub const DEFAULT_AOA_STEP: f64 = 2.0;

/// Settings read from an optional TOML file. Every field may be omitted.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    /// Path to the XFOIL executable.
    pub xfoil_path: Option<PathBuf>,

    pub polar_path: Option<PathBuf>,

    /// NACA 4-digit codes to analyze, in order.
    /// Example: ["2412", "0012"]
    pub airfoils: Option<Vec<String>>,

    pub reynolds: Option<f64>,

    pub mach: Option<f64>,

    pub iterations: Option<usize>,

    pub min_aoa: Option<f64>,

    pub max_aoa: Option<f64>,

    pub aoa_step: Option<f64>,

    pub output_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &str) -> Result<Self> {
        let path = tilde(path).to_string();
        let content =
            read_to_string(&path).with_context(|| format!("failed to read config file {}", path))?;
        toml::from_str(&content).with_context(|| format!("invalid config file {}", path))
    }
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub xfoil_path: PathBuf,
    pub polar_path: PathBuf,
    pub airfoils: Vec<String>,
    pub reynolds: f64,
    pub mach: f64,
    pub iterations: usize,
    pub min_aoa: f64,
    pub max_aoa: f64,
    pub aoa_step: f64,
    pub output_dir: PathBuf,
    pub svg: bool,
    pub csv: bool,
    pub show: bool,
    pub summary: Option<PathBuf>,
}

impl Settings {
    /// Command line (and its env fallbacks) first, then the config file, then defaults.
    pub fn resolve(cli: &Cli, mut file: FileConfig) -> Result<Self> {
        let airfoils = if cli.naca.is_empty() {
            file.airfoils
                .take()
                .unwrap_or_else(|| DEFAULT_AIRFOILS.iter().map(|s| s.to_string()).collect())
        } else {
            cli.naca.clone()
        };

        let settings = Settings {
            xfoil_path: cli
                .xfoil_path
                .clone()
                .or(file.xfoil_path.take())
                .unwrap_or_else(default_xfoil_path),
            polar_path: cli
                .polar_path
                .clone()
                .or(file.polar_path.take())
                .unwrap_or_else(|| PathBuf::from(foxil::DEFAULT_POLAR_FILE)),
            airfoils,
            reynolds: cli.reynolds.or(file.reynolds).unwrap_or(DEFAULT_REYNOLDS),
            mach: cli.mach.or(file.mach).unwrap_or(DEFAULT_MACH),
            iterations: cli
                .iterations
                .or(file.iterations)
                .unwrap_or(DEFAULT_ITERATIONS),
            min_aoa: cli.min_aoa.or(file.min_aoa).unwrap_or(DEFAULT_MIN_AOA),
            max_aoa: cli.max_aoa.or(file.max_aoa).unwrap_or(DEFAULT_MAX_AOA),
            aoa_step: cli.aoa_step.or(file.aoa_step).unwrap_or(DEFAULT_AOA_STEP),
            output_dir: cli
                .output_dir
                .clone()
                .or(file.output_dir.take())
                .unwrap_or_else(|| PathBuf::from(".")),
            svg: cli.svg,
            csv: cli.csv,
            show: cli.show,
            summary: cli.summary.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("min_aoa", self.min_aoa),
            ("max_aoa", self.max_aoa),
            ("aoa_step", self.aoa_step),
            ("reynolds", self.reynolds),
            ("mach", self.mach),
        ] {
            if !value.is_finite() {
                bail!("{} must be a finite number, got {}", name, value);
            }
        }
        if self.aoa_step <= 1e-6 {
            bail!("Angle of attack step must be positive and greater than a small threshold.");
        }
        if self.max_aoa < self.min_aoa {
            bail!("Maximum AoA must be greater than or equal to Minimum AoA.");
        }
        if self.angles().is_empty() {
            bail!(
                "Angle of attack sweep exceeds {} angles.",
                foxil::MAX_SWEEP_ANGLES
            );
        }
        if self.airfoils.is_empty() {
            bail!("No airfoils to analyze.");
        }
        for naca in &self.airfoils {
            validate_naca(naca)?;
        }
        Ok(())
    }

    pub fn angles(&self) -> Vec<f64> {
        foxil::aoa_range(self.min_aoa, self.max_aoa, self.aoa_step)
    }

    pub fn figure_path(&self, naca: &str) -> PathBuf {
        let ext = if self.svg { "svg" } else { "png" };
        self.output_dir.join(format!("naca_{}.{}", naca, ext))
    }

    pub fn csv_path(&self, naca: &str) -> PathBuf {
        self.output_dir.join(format!("naca_{}_polar.csv", naca))
    }
}
