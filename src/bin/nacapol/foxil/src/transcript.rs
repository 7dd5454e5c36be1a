//! Construction of the command sequences fed to XFOIL over stdin.
use std::path::Path;

/// Parameters of one polar accumulation run.
#[derive(Debug, Clone)]
pub struct PolarRequest {
    pub naca: String,
    pub angles: Vec<f64>,
    pub reynolds: f64,
    pub mach: f64,
    pub iterations: usize,
}

/// Ordered XFOIL commands, one per line.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    commands: Vec<String>,
}

impl Transcript {
    /// Commands for a viscous angle sweep accumulating into `polar`.
    pub fn polar(request: &PolarRequest, polar: &Path) -> Self {
        let mut commands = vec![
            format!("NACA {}", request.naca),
            "PANE".to_string(),
            "OPER".to_string(),
            format!("VISC {}", request.reynolds),
            format!("MACH {}", request.mach),
            format!("ITER {}", request.iterations),
            "PACC".to_string(),
            polar.to_string_lossy().to_string(),
            // no dump file
            String::new(),
        ];
        commands.extend(request.angles.iter().map(|alpha| format!("ALFA {}", alpha)));
        commands.push("QUIT".to_string());
        Self { commands }
    }

    /// Commands that panel the airfoil and save its coordinates to `target`.
    pub fn coordinates(naca: &str, target: &Path) -> Self {
        Self {
            commands: vec![
                format!("NACA {}", naca),
                "PANE".to_string(),
                format!("SAVE {}", target.to_string_lossy()),
                "QUIT".to_string(),
            ],
        }
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// The transcript as a single newline-terminated block of text.
    pub fn render(&self) -> String {
        self.commands.iter().map(|cmd| format!("{}\n", cmd)).collect()
    }
}
