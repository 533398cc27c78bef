//! Remediation hints for failed probes.
//!
//! Classification is a pure function over an ordered rule table: the first
//! rule whose pattern occurs in the lowercased message decides the category.
//! "module not found" also contains "not found", so it lands in
//! [`ErrorCategory::CommandNotFound`]; only "no module named" reaches the
//! module rule.

use std::path::Path;

use super::LaunchSpec;

/// Category of a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The program is not on `PATH`
    CommandNotFound,
    /// The OS refused to run or open something
    PermissionDenied,
    /// A Python module is missing
    ModuleNotFound,
    /// A JavaScript package is missing
    PackageNotFound,
    /// Anything else
    Unexpected,
}

struct Rule {
    category: ErrorCategory,
    patterns: &'static [&'static str],
}

const RULES: &[Rule] = &[
    Rule {
        category: ErrorCategory::CommandNotFound,
        patterns: &["not found", "is not recognized", "command not found"],
    },
    Rule {
        category: ErrorCategory::PermissionDenied,
        patterns: &["permission denied", "eacces"],
    },
    Rule {
        category: ErrorCategory::ModuleNotFound,
        patterns: &["module not found", "no module named"],
    },
    Rule {
        category: ErrorCategory::PackageNotFound,
        patterns: &["package not found", "cannot resolve"],
    },
];

impl ErrorCategory {
    /// First matching category for `message`, case-insensitively.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        RULES
            .iter()
            .find(|rule| rule.patterns.iter().any(|p| lower.contains(p)))
            .map_or(Self::Unexpected, |rule| rule.category)
    }

    fn suggestions(self, spec: &LaunchSpec) -> Vec<String> {
        match self {
            Self::CommandNotFound => {
                let mut lines = vec![
                    format!("Command '{}' not found in PATH", spec.command),
                    "Ensure the required software is installed".to_string(),
                    "Check that the command name is spelled correctly".to_string(),
                ];
                if let Some(hint) = runtime_hint(&spec.command) {
                    lines.push(hint.to_string());
                }
                lines
            }
            Self::PermissionDenied => owned(&[
                "Permission denied when running the command",
                "Try running with administrator/sudo privileges",
                "Check file and directory permissions",
            ]),
            Self::ModuleNotFound => owned(&[
                "Required Python module is not installed",
                "Use pip or uv to install the missing module",
                "Check if you need to activate a virtual environment",
            ]),
            Self::PackageNotFound => owned(&[
                "Required package is not installed",
                "Use npm install to install the missing package",
                "Check package.json dependencies",
            ]),
            Self::Unexpected => owned(&[
                "Unexpected error occurred during server testing",
                "Check the error output for specific details",
                "Verify all dependencies are installed",
            ]),
        }
    }
}

/// Install hint for well-known runtimes, matched on the program's file stem.
fn runtime_hint(command: &str) -> Option<&'static str> {
    let stem = Path::new(command).file_stem()?.to_str()?;
    match stem {
        "python" | "python3" => Some("Install Python from python.org or your package manager"),
        "node" | "npm" | "npx" => Some("Install Node.js from nodejs.org"),
        "uv" | "uvx" => Some("Install uv: pip install uv"),
        _ => None,
    }
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| (*s).to_string()).collect()
}

/// Ordered, non-empty remediation list for a failure `message`.
///
/// Environment guidance comes first when `spec` declares variables; the
/// installation helper pointer always comes last.
#[must_use]
pub fn classify_error(message: &str, spec: &LaunchSpec) -> Vec<String> {
    let mut recommendations = Vec::new();
    if spec.has_env() {
        recommendations.push(
            "Server uses environment variables - ensure they are properly configured".to_string(),
        );
        recommendations
            .push("Check that all required API keys/tokens are set and valid".to_string());
    }

    recommendations.extend(ErrorCategory::classify(message).suggestions(spec));
    recommendations.push("Use toolentry exec to install missing dependencies".to_string());
    recommendations
}
