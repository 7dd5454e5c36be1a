use anyhow::{bail, Result};
use colored::Colorize;
use foxil::result::AnalysisResult;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[cfg(windows)]
const XFOIL_BIN: &str = "xfoil.exe";
#[cfg(not(windows))]
const XFOIL_BIN: &str = "xfoil";

/// XFOIL next to this executable if present, otherwise whatever `xfoil` is on `PATH`.
pub fn default_xfoil_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(XFOIL_BIN)))
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(XFOIL_BIN))
}

pub fn validate_naca(code: &str) -> Result<()> {
    if code.len() != 4 || !code.chars().all(|c| c.is_ascii_digit()) {
        bail!("'{}' is not a NACA 4-digit designation", code);
    }
    Ok(())
}

pub fn setup_progress_bar(num_steps: u64, description: &str) -> ProgressBar {
    let pb = ProgressBar::new(num_steps);
    let template = format!(
        "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {}: {{msg}}",
        description
    );
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb
}

pub fn display_analysis_summary(naca: &str, reynolds: f64, result: &AnalysisResult) {
    println!("\n{}", "--- Best Aerodynamic Performance ---".green());
    println!("Airfoil: NACA {}", naca.bold());
    println!("Reynolds Number: {}", reynolds);
    println!("Best Angle of Attack (for max Cl/Cd): {:.2}°", result.aoa);
    println!("Lift Coefficient (Cl) at best AoA: {:.4}", result.cl);
    println!("Drag Coefficient (Cd) at best AoA: {:.4}", result.cd);
    println!("Maximum Cl/Cd Ratio: {:.4}", result.ld_ratio);
}

/// Hand a rendered figure to the desktop viewer. Failures are only logged.
pub fn open_in_viewer(path: &Path) {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    match cmd
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => info!("Opened {}", path.display()),
        Err(e) => warn!("Failed to open {}: {}", path.display(), e),
    }
}
