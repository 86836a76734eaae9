//! Standard paths used by Focusplay tools

use std::path::{Path, PathBuf};

/// Standard Focusplay paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/focusplay)
    pub data: PathBuf,
    /// Config directory (~/.config/focusplay)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("focusplay");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("focusplay");

        Self { data, config }
    }

    /// Paths rooted at a single directory, used for `--data-dir` and tests
    pub fn rooted(root: &Path) -> Self {
        Self {
            data: root.join("data"),
            config: root.join("config"),
        }
    }

    /// Get state directory for a tool
    pub fn state(&self, tool: &str) -> PathBuf {
        self.data.join(tool)
    }

    /// Get a config file path
    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config.join(name)
    }
}
