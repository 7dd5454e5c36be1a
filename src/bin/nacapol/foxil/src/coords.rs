use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{self, parse_field};

/// Airfoil surface points as written by XFOIL's `SAVE`, chord-normalised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl Coordinates {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.xs.iter().copied().zip(self.ys.iter().copied()).collect()
    }
}

/// Parse a coordinate dump: one name line, then `x y` rows.
pub fn parse_coordinates<R: BufRead>(reader: R) -> error::Result<Coordinates> {
    let mut coords = Coordinates::default();
    for (idx, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let parts = line.split_whitespace().collect::<Vec<_>>();
        if parts.len() < 2 {
            continue;
        }
        coords.xs.push(parse_field(parts[0], idx + 1)?);
        coords.ys.push(parse_field(parts[1], idx + 1)?);
    }
    Ok(coords)
}

pub fn read_coordinates(path: &Path) -> error::Result<Coordinates> {
    parse_coordinates(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn skips_name_line() {
        let coords = parse_coordinates(Cursor::new("NACA 0012\n0.0 0.0\n0.5 0.1\n")).unwrap();
        assert_eq!(coords.points(), vec![(0.0, 0.0), (0.5, 0.1)]);
    }

    #[test]
    fn ignores_short_rows() {
        let coords =
            parse_coordinates(Cursor::new("NACA 2412\n  1.00000  0.00126\n\n0.5\n  0.9 -0.01\n"))
                .unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords.ys, vec![0.00126, -0.01]);
    }

    #[test]
    fn empty_file_is_empty() {
        assert!(parse_coordinates(Cursor::new("")).unwrap().is_empty());
    }

    #[test]
    fn bad_number_fails() {
        assert!(parse_coordinates(Cursor::new("name\n0.1 nope\n")).is_err());
    }
}
