use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{self, parse_field};

/// Number of metadata lines at the top of an XFOIL polar file.
pub const POLAR_HEADER_LINES: usize = 12;
/// Rows shorter than this are not data rows.
const POLAR_MIN_FIELDS: usize = 6;

/// One converged operating point from a polar file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarRecord {
    pub alpha: f64,
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

impl PolarRecord {
    /// Lift over drag, zero when the drag coefficient is exactly zero.
    pub fn lift_drag_ratio(&self) -> f64 {
        if self.cd == 0.0 { 0.0 } else { self.cl / self.cd }
    }
}

/// Parse the body of a polar file, skipping the fixed-size header.
pub fn parse_polar<R: BufRead>(reader: R) -> error::Result<Vec<PolarRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate().skip(POLAR_HEADER_LINES) {
        let line = line?;
        let parts = line.split_whitespace().collect::<Vec<_>>();
        if parts.len() < POLAR_MIN_FIELDS {
            continue;
        }
        let line_no = idx + 1;
        records.push(PolarRecord {
            alpha: parse_field(parts[0], line_no)?,
            cl: parse_field(parts[1], line_no)?,
            cd: parse_field(parts[2], line_no)?,
            cm: parse_field(parts[4], line_no)?,
        });
    }
    Ok(records)
}

pub fn read_polar(path: &Path) -> error::Result<Vec<PolarRecord>> {
    parse_polar(BufReader::new(File::open(path)?))
}

/// Polar of a single airfoil in command order.
#[derive(Debug, Clone, Default)]
pub struct Polar {
    pub naca: String,
    pub records: Vec<PolarRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub aoa: f64,
    pub cl: f64,
    pub cd: f64,
    pub ld_ratio: f64,
}

impl From<&PolarRecord> for AnalysisResult {
    fn from(record: &PolarRecord) -> Self {
        AnalysisResult {
            aoa: record.alpha,
            cl: record.cl,
            cd: record.cd,
            ld_ratio: record.lift_drag_ratio(),
        }
    }
}

impl Polar {
    pub fn new(naca: &str, records: Vec<PolarRecord>) -> Self {
        Self {
            naca: naca.to_string(),
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn alphas(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.alpha).collect()
    }

    pub fn cls(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.cl).collect()
    }

    pub fn cds(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.cd).collect()
    }

    pub fn cms(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.cm).collect()
    }

    pub fn lift_drag_ratios(&self) -> Vec<f64> {
        self.records.iter().map(PolarRecord::lift_drag_ratio).collect()
    }

    pub fn export(&self) -> Vec<AnalysisResult> {
        self.records.iter().map(AnalysisResult::from).collect()
    }

    /// Operating point with the highest finite lift/drag ratio.
    pub fn best_ratio(&self) -> Option<AnalysisResult> {
        self.export()
            .into_iter()
            .filter(|r| r.ld_ratio.is_finite())
            .max_by(|a, b| a.ld_ratio.total_cmp(&b.ld_ratio))
    }

    pub fn to_csv(&self, path: &Path) -> error::Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["alpha", "CL", "CD", "CM", "CL/CD"])?;
        for record in &self.records {
            wtr.write_record(&[
                record.alpha.to_string(),
                record.cl.to_string(),
                record.cd.to_string(),
                record.cm.to_string(),
                record.lift_drag_ratio().to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
