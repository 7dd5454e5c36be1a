use std::io;
use std::num;
use std::path::PathBuf;
use std::{error, fmt};

#[derive(Debug)]
pub enum FoxilError {
    /// The XFOIL executable could not be spawned because it does not exist.
    SolverNotFound(PathBuf),
    /// A polar run was requested without selecting an airfoil.
    MissingAirfoil,
    IoError(io::Error),
    /// A data row had enough columns but one of them was not a number.
    ParseError {
        line: usize,
        source: num::ParseFloatError,
    },
}

impl From<io::Error> for FoxilError {
    fn from(error: io::Error) -> Self {
        FoxilError::IoError(error)
    }
}

impl From<csv::Error> for FoxilError {
    fn from(error: csv::Error) -> Self {
        FoxilError::IoError(error.into())
    }
}

impl fmt::Display for FoxilError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FoxilError::SolverNotFound(path) => {
                write!(f, "XFOIL not found at {}", path.display())
            }
            FoxilError::MissingAirfoil => write!(f, "XFOIL cannot run without an airfoil"),
            FoxilError::IoError(e) => write!(f, "I/O error while talking to XFOIL: {}", e),
            FoxilError::ParseError { line, source } => {
                write!(f, "malformed number on line {}: {}", line, source)
            }
        }
    }
}

impl error::Error for FoxilError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            FoxilError::SolverNotFound(_) | FoxilError::MissingAirfoil => None,
            FoxilError::IoError(e) => Some(e),
            FoxilError::ParseError { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, FoxilError>;

/// Parse a whitespace-separated token, tagging failures with the 1-based line number.
pub(crate) fn parse_field(token: &str, line: usize) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|source| FoxilError::ParseError { line, source })
}
