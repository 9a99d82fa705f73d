// ToolLocator - finds yt-dlp / python on this machine and reports versions

use serde::{Deserialize, Serialize};
use std::process::Command;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Python,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Python => "python3",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

pub struct ToolLocator;

impl ToolLocator {
    /// yt-dlp binary: common install paths first, then PATH, else the bare name
    pub fn find_ytdlp() -> String {
        Self::detect(ToolType::YtDlp).unwrap_or_else(|| ToolType::YtDlp.as_str().to_string())
    }

    /// Python interpreter: `YTDLP_PYTHON` override, then the first one that runs
    pub fn find_python() -> String {
        if let Ok(custom) = std::env::var("YTDLP_PYTHON") {
            return custom;
        }

        let candidates = ["python3", "/opt/homebrew/bin/python3", "/usr/local/bin/python3"];
        for cmd in candidates {
            if Self::version_of(cmd, "--version").is_some() {
                return cmd.to_string();
            }
        }

        ToolType::Python.as_str().to_string()
    }

    /// Whether `python -c "import yt_dlp"` succeeds
    pub fn python_has_ytdlp(python: &str) -> bool {
        match Command::new(python).args(["-c", "import yt_dlp"]).output() {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    /// Whether `<path> --version` succeeds
    pub fn binary_runs(path: &str) -> bool {
        Self::version_of(path, "--version").is_some()
    }

    pub fn tool_info(tool_type: ToolType) -> ToolInfo {
        let path = match tool_type {
            ToolType::YtDlp => Self::detect(tool_type),
            ToolType::Python => Some(Self::find_python()),
        };
        let version = path.as_deref().and_then(|p| Self::version_of(p, "--version"));

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            is_available: version.is_some(),
            version,
            path,
        }
    }

    fn detect(tool_type: ToolType) -> Option<String> {
        let binary_name = tool_type.as_str();

        let common_paths = [
            format!("/opt/homebrew/bin/{}", binary_name),
            format!("/usr/local/bin/{}", binary_name),
            format!("/usr/bin/{}", binary_name),
        ];

        for path in common_paths {
            if std::path::Path::new(&path).exists() {
                return Some(path);
            }
        }

        if let Ok(output) = Command::new("which").arg(binary_name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }

        None
    }

    fn version_of(path: &str, arg: &str) -> Option<String> {
        match Command::new(path).arg(arg).output() {
            Ok(output) if output.status.success() => {
                let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
                // python2 prints its version on stderr
                if out.is_empty() {
                    Some(String::from_utf8_lossy(&output.stderr).trim().to_string())
                } else {
                    Some(out)
                }
            }
            _ => None,
        }
    }
}
