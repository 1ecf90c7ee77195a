//! Probe configuration
//!
//! File names and directories used around test scripts, and the default
//! polling behaviour of commanders. Passed by reference wherever it is
//! needed; there is no global configuration.

use crate::result::{ProbeError, ProbeResult};
use crate::wait::{PollOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration shared by commanders and test-script helpers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Generated HTML documentation of a test script
    pub doc_html_filename: String,
    /// Test data file next to a test script
    pub test_data_filename: String,
    /// Requirements file next to a test script
    pub requirements_filename: String,
    /// Configuration directory holding templates
    pub config_dir: PathBuf,
    /// Default commander timeout in seconds
    pub default_timeout_secs: u64,
    /// Pause between two polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            doc_html_filename: "TestScript-doc.html".to_string(),
            test_data_filename: "TestData.csv".to_string(),
            requirements_filename: "TestRequirements.xml".to_string(),
            config_dir: PathBuf::from("conf"),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ProbeConfig {
    /// Create a default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration directory
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Set default timeout
    #[must_use]
    pub const fn with_default_timeout(mut self, secs: u64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    /// Set poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Polling options derived from this configuration
    #[must_use]
    pub const fn poll_options(&self) -> PollOptions {
        PollOptions {
            timeout_secs: self.default_timeout_secs,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Directory holding the template files of new test scripts
    #[must_use]
    pub fn test_script_template_dir(&self) -> PathBuf {
        self.config_dir.join("templates").join("TestScript")
    }

    /// Load from a YAML or JSON file, chosen by extension
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml_ng::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> ProbeResult<()> {
        let names = [
            ("doc_html_filename", &self.doc_html_filename),
            ("test_data_filename", &self.test_data_filename),
            ("requirements_filename", &self.requirements_filename),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(ProbeError::config(format!("{field} must not be empty")));
            }
            if value.contains(['/', '\\']) {
                return Err(ProbeError::config(format!(
                    "{field} must be a bare file name, got {value:?}"
                )));
            }
        }
        if self.poll_interval_ms == 0 {
            return Err(ProbeError::config("poll_interval_ms must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.doc_html_filename, "TestScript-doc.html");
        assert_eq!(config.requirements_filename, "TestRequirements.xml");
        assert_eq!(config.poll_interval_ms, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poll_options_follow_config() {
        let config = ProbeConfig::new()
            .with_default_timeout(3)
            .with_poll_interval(40);
        let opts = config.poll_options();
        assert_eq!(opts.timeout_secs, 3);
        assert_eq!(opts.poll_interval_ms, 40);
    }

    #[test]
    fn test_template_dir() {
        let config = ProbeConfig::new().with_config_dir("/opt/probe/conf");
        assert_eq!(
            config.test_script_template_dir(),
            PathBuf::from("/opt/probe/conf/templates/TestScript")
        );
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.yaml");
        fs::write(&path, "test_data_filename: data.csv\npoll_interval_ms: 250\n").unwrap();

        let config = ProbeConfig::load(&path).unwrap();
        assert_eq!(config.test_data_filename, "data.csv");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.doc_html_filename, "TestScript-doc.html");
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.json");
        fs::write(&path, r#"{"default_timeout_secs": 7}"#).unwrap();
        assert_eq!(ProbeConfig::load(&path).unwrap().default_timeout_secs, 7);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.yaml");
        fs::write(&path, "doc_html_filename: docs/out.html\n").unwrap();
        let err = ProbeConfig::load(&path).unwrap_err();
        assert!(matches!(err, ProbeError::Config { .. }));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.yaml");
        fs::write(&path, "doc_xml_filename: old.xml\npoll_interval_ms: 300\n").unwrap();
        let config = ProbeConfig::load(&path).unwrap();
        assert_eq!(config, ProbeConfig::new().with_poll_interval(300));
    }

    #[test]
    fn test_zero_poll_interval_is_invalid() {
        let config = ProbeConfig::new().with_poll_interval(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ProbeConfig::load(Path::new("/nonexistent/probe.yaml")).unwrap_err();
        assert!(matches!(err, ProbeError::Io(_)));
    }
}
