use log::{debug, error, info, warn};
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

pub mod coords;
pub mod error;
pub mod result;
pub mod transcript;

use coords::{read_coordinates, Coordinates};
use error::FoxilError;
use result::{read_polar, Polar};
use transcript::{PolarRequest, Transcript};

/// Line XFOIL prints when the viscous solution does not converge for an angle.
const CONVERGENCE_FAILED: &str = "VISCAL:  Convergence failed";

/// Polar file used when none is configured, resolved against the working directory.
pub const DEFAULT_POLAR_FILE: &str = "polar_temp.txt";

/// Captured console output of one XFOIL process.
#[derive(Debug, Default)]
pub struct SolverOutput {
    pub stdout: String,
    pub stderr: String,
}

impl SolverOutput {
    /// Number of angles for which the viscous iteration gave up.
    pub fn convergence_failures(&self) -> usize {
        self.stdout
            .lines()
            .filter(|line| line.trim() == CONVERGENCE_FAILED)
            .count()
    }

    fn report(&self, naca: &str) {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            warn!("XFOIL error output (NACA {}): {}", naca, stderr);
        }
        let failures = self.convergence_failures();
        if failures > 0 {
            warn!(
                "XFOIL did not converge for {} angle(s) of NACA {}",
                failures, naca
            );
        }
    }
}

/// Handle to an XFOIL executable.
#[derive(Debug, Clone)]
pub struct Xfoil {
    path: PathBuf,
}

impl Xfoil {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Run one XFOIL process fed with `transcript` and wait for it to exit.
    /// The transcript is written to stdin in one shot and stdin is then closed.
    /// There is no timeout; a solver that never reads `QUIT` blocks the caller.
    pub fn run(&self, transcript: &Transcript) -> error::Result<SolverOutput> {
        debug!("XFOIL transcript:\n{}", transcript.render());
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => FoxilError::SolverNotFound(self.path.clone()),
                _ => FoxilError::IoError(e),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            io::Error::new(ErrorKind::BrokenPipe, "failed to retrieve handle to child stdin")
        })?;
        let input = transcript.render();
        // stdout is drained concurrently so a chatty solver cannot stall the write
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        match writer.join() {
            Ok(Err(e)) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
            Ok(_) => {}
            Err(_) => return Err(io::Error::other("stdin writer thread panicked").into()),
        }

        let output = SolverOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("XFOIL wrote {} bytes to stdout", output.stdout.len());
        Ok(output)
    }

    /// Panel a NACA airfoil and read back its surface coordinates.
    ///
    /// The dump goes to a fresh temporary directory that is removed when this
    /// returns, whether reading succeeded or not.
    pub fn coordinates(&self, naca: &str) -> error::Result<Coordinates> {
        let workdir = tempfile::Builder::new().prefix("foxil-").tempdir()?;
        let target = workdir.path().join(format!("naca_{}.txt", naca));

        self.run(&Transcript::coordinates(naca, &target))?
            .report(naca);
        let coords = read_coordinates(&target)?;
        debug!("Read {} coordinates for NACA {}", coords.len(), naca);
        Ok(coords)
    }
}

/// Upper bound on the number of angles a single sweep may command.
pub const MAX_SWEEP_ANGLES: usize = 100_000;

/// Angles from `min` to `max` inclusive, spaced by `step`.
/// Empty for non-finite inputs, a non-positive step, `max < min`, or a sweep
/// longer than `MAX_SWEEP_ANGLES`.
pub fn aoa_range(min: f64, max: f64, step: f64) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite() && step.is_finite()) || step <= 0.0 || max < min {
        return vec![];
    }
    let intervals = ((max - min) / step + 1e-9).floor();
    if !intervals.is_finite() || intervals >= MAX_SWEEP_ANGLES as f64 {
        return vec![];
    }
    let Some(num_steps) = (intervals as usize).checked_add(1) else {
        return vec![];
    };
    (0..num_steps)
        .map(|i| ((min + i as f64 * step) * 1e6).round() / 1e6)
        .collect()
}

/// Builder for an XFOIL polar accumulation run.
pub struct FoxConfig {
    xfoil: Xfoil,
    naca: Option<String>,
    angles: Vec<f64>,
    reynolds: f64,
    mach: f64,
    iterations: usize,
    polar: Option<PathBuf>,
}

impl FoxConfig {
    /// Create a configuration from the path to an XFOIL executable.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            xfoil: Xfoil::new(path),
            naca: None,
            angles: vec![],
            reynolds: 1e6,
            mach: 0.0,
            iterations: 100,
            polar: None,
        }
    }

    /// Specify a 4-digit NACA airfoil code.
    pub fn naca(mut self, code: &str) -> Self {
        self.naca = Some(code.to_string());
        self
    }

    /// Angles of attack, swept in the given order.
    pub fn angles(mut self, angles: Vec<f64>) -> Self {
        self.angles = angles;
        self
    }

    pub fn aoa_range(self, min: f64, max: f64, step: f64) -> Self {
        self.angles(aoa_range(min, max, step))
    }

    /// Set a Reynolds number for the viscous calculation.
    pub fn reynolds(mut self, reynolds: f64) -> Self {
        self.reynolds = reynolds;
        self
    }

    pub fn mach(mut self, mach: f64) -> Self {
        self.mach = mach;
        self
    }

    /// Cap on viscous iterations per angle.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set path of the polar file XFOIL accumulates into.
    pub fn polar_accumulation(mut self, path: impl AsRef<Path>) -> Self {
        self.polar = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn get_runner(self) -> error::Result<PolarRunner> {
        let naca = self.naca.ok_or(FoxilError::MissingAirfoil)?;
        let polar = self
            .polar
            .unwrap_or_else(|| PathBuf::from(DEFAULT_POLAR_FILE));
        // XFOIL always gets an absolute path
        let polar = if polar.is_relative() {
            std::env::current_dir()?.join(polar)
        } else {
            polar
        };

        Ok(PolarRunner {
            xfoil: self.xfoil,
            request: PolarRequest {
                naca,
                angles: self.angles,
                reynolds: self.reynolds,
                mach: self.mach,
                iterations: self.iterations,
            },
            polar,
        })
    }
}

pub struct PolarRunner {
    xfoil: Xfoil,
    request: PolarRequest,
    polar: PathBuf,
}

impl PolarRunner {
    pub fn transcript(&self) -> Transcript {
        Transcript::polar(&self.request, &self.polar)
    }

    pub fn polar_path(&self) -> &Path {
        &self.polar
    }

    /// Run the sweep and read back the accumulated polar.
    ///
    /// Returns `Ok(None)` when the XFOIL executable does not exist, and an empty
    /// polar when XFOIL never wrote the polar file. The polar file is deleted
    /// once it has been read; a read or parse failure leaves it in place.
    pub fn dispatch(self) -> error::Result<Option<Polar>> {
        let naca = self.request.naca.as_str();
        let output = match self.xfoil.run(&self.transcript()) {
            Err(FoxilError::SolverNotFound(path)) => {
                error!("XFOIL not found at {}", path.display());
                return Ok(None);
            }
            result => result?,
        };
        output.report(naca);

        if !self.polar.exists() {
            warn!("Polar file not found for airfoil {}.", naca);
            return Ok(Some(Polar::new(naca, vec![])));
        }
        let records = read_polar(&self.polar)?;
        fs::remove_file(&self.polar)?;
        info!("NACA {}: {} polar point(s)", naca, records.len());
        Ok(Some(Polar::new(naca, records)))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::OnceLock;
    use tempfile::TempDir;

    const POLAR_BODY: &str = r#"
polar=""
angles=""
next_is_path=0
while IFS= read -r line; do
    if [ "$next_is_path" = 1 ]; then
        polar="$line"
        next_is_path=0
        continue
    fi
    case "$line" in
        PACC) next_is_path=1 ;;
        "ALFA "*) angles="$angles ${line#ALFA }" ;;
        QUIT) break ;;
    esac
done
if [ -n "$polar" ]; then
    : > "$polar"
    i=0
    while [ "$i" -lt 12 ]; do
        echo " header $i" >> "$polar"
        i=$((i + 1))
    done
    for a in $angles; do
        echo "  $a  0.5000  0.01000  0.00500  -0.0500  0.9000  1.0000" >> "$polar"
    done
fi
"#;

    const NOISY_TAIL: &str = r#"
echo "LU decomposition warning" >&2
echo " VISCAL:  Convergence failed"
echo " VISCAL:  Convergence failed"
"#;

    const SAVE_BODY: &str = r#"
naca=""
target=""
while IFS= read -r line; do
    case "$line" in
        "NACA "*) naca="${line#NACA }" ;;
        "SAVE "*) target="${line#SAVE }" ;;
        QUIT) break ;;
    esac
done
echo "$target" > "$(dirname "$0")/saved_$naca.log"
if [ "$naca" = "9999" ]; then
    printf 'NACA 9999\n0.1 nope\n' > "$target"
else
    printf 'NACA %s\n0.0 0.0\n0.5 0.1\n' "$naca" > "$target"
fi
"#;

    const SILENT_BODY: &str = "cat > /dev/null\n";

    const GARBLED_TAIL: &str = r#"
printf 'panel \377\376 done\n'
printf 'warn \377\n' >&2
"#;

    const BAD_ROW_BODY: &str = r#"
polar=""
next_is_path=0
while IFS= read -r line; do
    if [ "$next_is_path" = 1 ]; then
        polar="$line"
        next_is_path=0
        continue
    fi
    case "$line" in
        PACC) next_is_path=1 ;;
        QUIT) break ;;
    esac
done
: > "$polar"
i=0
while [ "$i" -lt 12 ]; do
    echo " header $i" >> "$polar"
    i=$((i + 1))
done
echo "  0.0  0.1  0.01  0.0  x  0.5" >> "$polar"
"#;

    /// Stub solvers, written once so no test execs a script while another writes one.
    fn stubs() -> &'static Path {
        static STUBS: OnceLock<TempDir> = OnceLock::new();
        STUBS
            .get_or_init(|| {
                let dir = tempfile::tempdir().unwrap();
                for (name, body) in [
                    ("polar.sh", POLAR_BODY.to_string()),
                    ("noisy.sh", format!("{}{}", POLAR_BODY, NOISY_TAIL)),
                    ("save.sh", SAVE_BODY.to_string()),
                    ("silent.sh", SILENT_BODY.to_string()),
                    ("garbled.sh", format!("{}{}", POLAR_BODY, GARBLED_TAIL)),
                    ("bad_row.sh", BAD_ROW_BODY.to_string()),
                ] {
                    let path = dir.path().join(name);
                    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
                    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
                }
                dir
            })
            .path()
    }

    fn stub(name: &str) -> PathBuf {
        stubs().join(name)
    }

    #[test]
    fn no_foil() {
        assert!(matches!(
            FoxConfig::new("xfoil").get_runner(),
            Err(FoxilError::MissingAirfoil)
        ));
    }

    #[test]
    fn relative_polar_path_is_absolutized() {
        let runner = FoxConfig::new("xfoil").naca("2412").get_runner().unwrap();
        assert!(runner.polar_path().is_absolute());
        assert!(runner.polar_path().ends_with(DEFAULT_POLAR_FILE));
    }

    #[test]
    fn aoa_range_is_inclusive() {
        assert_eq!(
            aoa_range(0.0, 14.0, 2.0),
            vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0]
        );
        assert_eq!(aoa_range(0.0, 1.0, 0.1).len(), 11);
        assert_eq!(aoa_range(0.0, 1.0, 0.1)[3], 0.3);
        assert!(aoa_range(2.0, 1.0, 0.5).is_empty());
    }

    #[test]
    fn aoa_range_rejects_unbounded_sweeps() {
        assert!(aoa_range(0.0, f64::INFINITY, 2.0).is_empty());
        assert!(aoa_range(f64::NEG_INFINITY, 0.0, 2.0).is_empty());
        assert!(aoa_range(0.0, 4.0, f64::NAN).is_empty());
        assert!(aoa_range(f64::NAN, 4.0, 1.0).is_empty());
        assert!(aoa_range(0.0, 1e12, 1e-5).is_empty());
        assert_eq!(aoa_range(0.0, 99_998.0, 1.0).len(), 99_999);
    }

    #[test]
    fn sweep_0012_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let polar_file = dir.path().join("polar.txt");
        let polar = FoxConfig::new(stub("polar.sh"))
            .naca("0012")
            .angles(vec![0.0, 2.0, 4.0])
            .polar_accumulation(&polar_file)
            .get_runner()
            .unwrap()
            .dispatch()
            .unwrap()
            .expect("stub solver exists");
        assert_eq!(polar.naca, "0012");
        assert_eq!(polar.alphas(), vec![0.0, 2.0, 4.0]);
        assert_eq!(polar.cls(), vec![0.5; 3]);
        assert_eq!(polar.cms(), vec![-0.05; 3]);
        assert!(!polar_file.exists(), "polar file is removed after reading");
    }

    #[test]
    fn stderr_output_is_only_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let xfoil = Xfoil::new(stub("noisy.sh"));
        let transcript = Transcript::polar(
            &PolarRequest {
                naca: "4412".to_string(),
                angles: vec![1.0],
                reynolds: 1e6,
                mach: 0.0,
                iterations: 100,
            },
            &dir.path().join("p.txt"),
        );
        let output = xfoil.run(&transcript).unwrap();
        assert_eq!(output.stderr.trim(), "LU decomposition warning");
        assert_eq!(output.convergence_failures(), 2);

        let polar = FoxConfig::new(stub("noisy.sh"))
            .naca("4412")
            .aoa_range(2.0, 4.0, 2.0)
            .polar_accumulation(dir.path().join("polar.txt"))
            .get_runner()
            .unwrap()
            .dispatch()
            .unwrap()
            .unwrap();
        assert_eq!(polar.records.len(), 2);
    }

    #[test]
    fn non_utf8_console_output_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let polar = FoxConfig::new(stub("garbled.sh"))
            .naca("2412")
            .angles(vec![0.0, 2.0])
            .polar_accumulation(dir.path().join("polar.txt"))
            .get_runner()
            .unwrap()
            .dispatch()
            .unwrap()
            .unwrap();
        assert_eq!(polar.alphas(), vec![0.0, 2.0]);
    }

    #[test]
    fn parse_failure_leaves_polar_file() {
        let dir = tempfile::tempdir().unwrap();
        let polar_file = dir.path().join("polar.txt");
        let result = FoxConfig::new(stub("bad_row.sh"))
            .naca("2412")
            .angles(vec![0.0])
            .polar_accumulation(&polar_file)
            .get_runner()
            .unwrap()
            .dispatch();
        assert!(matches!(result, Err(FoxilError::ParseError { line: 13, .. })));
        assert!(polar_file.exists());
    }

    #[test]
    fn missing_polar_file_gives_empty_polar() {
        let dir = tempfile::tempdir().unwrap();
        let polar = FoxConfig::new(stub("silent.sh"))
            .naca("2412")
            .angles(vec![0.0, 2.0])
            .polar_accumulation(dir.path().join("never_written.txt"))
            .get_runner()
            .unwrap()
            .dispatch()
            .unwrap()
            .unwrap();
        assert!(polar.is_empty());
    }

    #[test]
    fn missing_solver_gives_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let result = FoxConfig::new(dir.path().join("xfoil"))
            .naca("2412")
            .angles(vec![0.0])
            .polar_accumulation(dir.path().join("polar.txt"))
            .get_runner()
            .unwrap()
            .dispatch()
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn coordinates_are_read_and_temp_file_removed() {
        let coords = Xfoil::new(stub("save.sh")).coordinates("0012").unwrap();
        assert_eq!(coords.points(), vec![(0.0, 0.0), (0.5, 0.1)]);

        let saved = fs::read_to_string(stubs().join("saved_0012.log")).unwrap();
        let saved = Path::new(saved.trim());
        assert!(saved.ends_with("naca_0012.txt"));
        assert!(!saved.exists());
        assert!(!saved.parent().unwrap().exists());
    }

    #[test]
    fn temp_file_removed_when_read_fails() {
        let result = Xfoil::new(stub("save.sh")).coordinates("9999");
        assert!(matches!(result, Err(FoxilError::ParseError { line: 2, .. })));

        let saved = fs::read_to_string(stubs().join("saved_9999.log")).unwrap();
        assert!(!Path::new(saved.trim()).exists());
    }

    #[test]
    fn coordinates_missing_dump_is_io_error() {
        let result = Xfoil::new(stub("silent.sh")).coordinates("2412");
        assert!(matches!(result, Err(FoxilError::IoError(ref e)) if e.kind() == ErrorKind::NotFound));
    }

    #[test]
    fn coordinates_missing_solver_is_error() {
        let result = Xfoil::new("/nonexistent/xfoil").coordinates("2412");
        assert!(matches!(result, Err(FoxilError::SolverNotFound(_))));
    }
}
