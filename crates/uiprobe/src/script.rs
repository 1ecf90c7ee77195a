//! Test script companion files
//!
//! A test script lives in its own directory next to optional companion
//! files: generated documentation, test data and requirements. File names
//! come from [`ProbeConfig`] and are matched case-insensitively.

use crate::config::ProbeConfig;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Find `name` in `dir`, ignoring case.
///
/// Entries are visited sorted by file name, so the result is stable when
/// several entries differ only by case. A missing or unreadable directory
/// yields `None`.
#[must_use]
pub fn find_file_in(name: &str, dir: &Path) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    let wanted = name.to_lowercase();
    entries.into_iter().find(|path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.to_lowercase() == wanted)
    })
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Summary of a script's companion files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanionReport {
    /// Script file
    pub script: PathBuf,
    /// Documentation, if generated
    pub doc: Option<PathBuf>,
    /// Test data, if present
    pub data: Option<PathBuf>,
    /// Requirements, if present or created from the template
    pub requirements: Option<PathBuf>,
    /// Whether the documentation is newer than everything it documents
    pub doc_synchronized: bool,
}

/// A test script and its companion files
#[derive(Debug)]
pub struct TestScript<'a> {
    config: &'a ProbeConfig,
    script: PathBuf,
    dir: PathBuf,
    doc: Option<PathBuf>,
    data: Option<PathBuf>,
    requirements: Option<PathBuf>,
}

impl<'a> TestScript<'a> {
    /// Wrap the script at `script`
    #[must_use]
    pub fn new(script: impl Into<PathBuf>, config: &'a ProbeConfig) -> Self {
        let script = script.into();
        let dir = parent_dir(&script);
        Self {
            config,
            script,
            dir,
            doc: None,
            data: None,
            requirements: None,
        }
    }

    /// Script file
    #[must_use]
    pub fn script_file(&self) -> &Path {
        &self.script
    }

    /// Directory holding the script and its companions
    #[must_use]
    pub fn script_dir(&self) -> &Path {
        &self.dir
    }

    /// Switch to another script, forgetting every cached companion
    pub fn set_script_file(&mut self, script: impl Into<PathBuf>) {
        self.script = script.into();
        self.dir = parent_dir(&self.script);
        self.doc = None;
        self.data = None;
        self.requirements = None;
    }

    /// Generated HTML documentation
    pub fn testcase_doc(&mut self) -> Option<PathBuf> {
        if self.doc.is_none() {
            self.doc = find_file_in(&self.config.doc_html_filename, &self.dir);
        }
        self.doc.clone()
    }

    /// Test data file
    pub fn testcase_data(&mut self) -> Option<PathBuf> {
        if self.data.is_none() {
            self.data = find_file_in(&self.config.test_data_filename, &self.dir);
        }
        self.data.clone()
    }

    /// Requirements file, created from the configured template when missing.
    ///
    /// A failed copy is logged and yields `None`.
    pub fn testcase_requirements(&mut self) -> Option<PathBuf> {
        if self.requirements.is_none() {
            self.requirements = find_file_in(&self.config.requirements_filename, &self.dir)
                .or_else(|| match self.create_requirements() {
                    Ok(path) => Some(path),
                    Err(e) => {
                        tracing::error!(
                            dir = %self.dir.display(),
                            error = %e,
                            "could not create requirements file from template"
                        );
                        None
                    }
                });
        }
        self.requirements.clone()
    }

    fn create_requirements(&self) -> io::Result<PathBuf> {
        let name = &self.config.requirements_filename;
        let template = self.config.test_script_template_dir().join(name);
        let target = self.dir.join(name);
        fs::copy(&template, &target)?;
        tracing::debug!(target = %target.display(), "created requirements file from template");
        Ok(target)
    }

    /// Whether the documentation is strictly newer than the script, its data
    /// and its requirements. False when there is no documentation.
    pub fn is_doc_synchronized(&mut self) -> bool {
        let Some(doc) = self.testcase_doc() else {
            return false;
        };
        let Some(doc_time) = modified(&doc) else {
            return false;
        };

        let mut newest = modified(&self.script);
        for companion in [self.testcase_data(), self.testcase_requirements()]
            .into_iter()
            .flatten()
        {
            newest = newest.max(modified(&companion));
        }
        newest.map_or(true, |t| t < doc_time)
    }

    /// Collect every companion at once
    pub fn report(&mut self) -> CompanionReport {
        let doc_synchronized = self.is_doc_synchronized();
        CompanionReport {
            script: self.script.clone(),
            doc: self.testcase_doc(),
            data: self.testcase_data(),
            requirements: self.testcase_requirements(),
            doc_synchronized,
        }
    }
}

fn parent_dir(script: &Path) -> PathBuf {
    script
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(path: &Path, at: SystemTime) {
        fs::write(path, "x").unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(at)
            .unwrap();
    }

    fn ago(secs: u64) -> SystemTime {
        SystemTime::now() - Duration::from_secs(secs)
    }

    struct Fixture {
        _root: TempDir,
        config: ProbeConfig,
        script_dir: PathBuf,
        template_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let config_dir = root.path().join("conf");
        let config = ProbeConfig::new().with_config_dir(&config_dir);
        let template_dir = config.test_script_template_dir();
        fs::create_dir_all(&template_dir).unwrap();
        let script_dir = root.path().join("TestSuites").join("Login");
        fs::create_dir_all(&script_dir).unwrap();
        touch(&script_dir.join("TestScript.py"), ago(100));
        Fixture {
            _root: root,
            config,
            script_dir,
            template_dir,
        }
    }

    mod find_file_tests {
        use super::*;

        #[test]
        fn test_matches_ignoring_case() {
            let fx = fixture();
            fs::write(fx.script_dir.join("testdata.CSV"), "").unwrap();
            let found = find_file_in("TestData.csv", &fx.script_dir).unwrap();
            assert_eq!(found.file_name().unwrap(), "testdata.CSV");
        }

        #[test]
        fn test_case_folding_is_not_ascii_only() {
            let fx = fixture();
            fs::write(fx.script_dir.join("DONNÉES.csv"), "").unwrap();
            let found = find_file_in("données.csv", &fx.script_dir).unwrap();
            assert_eq!(found.file_name().unwrap(), "DONNÉES.csv");
        }

        #[test]
        fn test_picks_first_in_sorted_order() {
            let fx = fixture();
            fs::write(fx.script_dir.join("testdata.csv"), "").unwrap();
            fs::write(fx.script_dir.join("TESTDATA.csv"), "").unwrap();
            let found = find_file_in("TestData.csv", &fx.script_dir).unwrap();
            assert_eq!(found.file_name().unwrap(), "TESTDATA.csv");
        }

        #[test]
        fn test_missing_file() {
            let fx = fixture();
            assert!(find_file_in("nope.txt", &fx.script_dir).is_none());
        }

        #[test]
        fn test_missing_dir() {
            assert!(find_file_in("x", Path::new("/definitely/not/here")).is_none());
        }
    }

    mod companion_tests {
        use super::*;

        #[test]
        fn test_doc_and_data_lookup() {
            let fx = fixture();
            fs::write(fx.script_dir.join("TestScript-doc.html"), "").unwrap();
            fs::write(fx.script_dir.join("TestData.csv"), "").unwrap();
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);

            assert_eq!(script.script_dir(), fx.script_dir.as_path());
            assert!(script.testcase_doc().is_some());
            assert!(script.testcase_data().is_some());
        }

        #[test]
        fn test_lookups_are_cached_until_script_changes() {
            let fx = fixture();
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);
            fs::write(fx.script_dir.join("TestData.csv"), "").unwrap();
            let data = script.testcase_data().unwrap();

            fs::remove_file(&data).unwrap();
            assert_eq!(script.testcase_data(), Some(data));

            script.set_script_file(fx.script_dir.join("TestScript.py"));
            assert!(script.testcase_data().is_none());
        }

        #[test]
        fn test_requirements_created_from_template() {
            let fx = fixture();
            fs::write(fx.template_dir.join("TestRequirements.xml"), "<reqs/>").unwrap();
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);

            let reqs = script.testcase_requirements().unwrap();
            assert_eq!(reqs, fx.script_dir.join("TestRequirements.xml"));
            assert_eq!(fs::read_to_string(reqs).unwrap(), "<reqs/>");
        }

        #[test]
        fn test_existing_requirements_are_kept() {
            let fx = fixture();
            fs::write(fx.template_dir.join("TestRequirements.xml"), "<template/>").unwrap();
            fs::write(fx.script_dir.join("testrequirements.xml"), "<mine/>").unwrap();
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);

            let reqs = script.testcase_requirements().unwrap();
            assert_eq!(fs::read_to_string(reqs).unwrap(), "<mine/>");
        }

        #[test]
        fn test_missing_template_yields_none() {
            let fx = fixture();
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);
            assert!(script.testcase_requirements().is_none());
        }
    }

    mod sync_tests {
        use super::*;

        #[test]
        fn test_no_doc_is_not_synchronized() {
            let fx = fixture();
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);
            assert!(!script.is_doc_synchronized());
        }

        #[test]
        fn test_doc_newer_than_everything() {
            let fx = fixture();
            touch(&fx.script_dir.join("TestData.csv"), ago(90));
            touch(&fx.script_dir.join("TestRequirements.xml"), ago(80));
            touch(&fx.script_dir.join("TestScript-doc.html"), ago(10));
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);
            assert!(script.is_doc_synchronized());
        }

        #[test]
        fn test_newer_data_makes_doc_stale() {
            let fx = fixture();
            touch(&fx.script_dir.join("TestScript-doc.html"), ago(50));
            touch(&fx.script_dir.join("TestData.csv"), ago(5));
            touch(&fx.script_dir.join("TestRequirements.xml"), ago(80));
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);
            assert!(!script.is_doc_synchronized());
        }

        #[test]
        fn test_newer_script_makes_doc_stale() {
            let fx = fixture();
            touch(&fx.script_dir.join("TestScript-doc.html"), ago(200));
            touch(&fx.script_dir.join("TestRequirements.xml"), ago(300));
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);
            assert!(!script.is_doc_synchronized());
        }

        #[test]
        fn test_report_collects_companions() {
            let fx = fixture();
            touch(&fx.script_dir.join("TestRequirements.xml"), ago(80));
            touch(&fx.script_dir.join("TestScript-doc.html"), ago(10));
            let mut script = TestScript::new(fx.script_dir.join("TestScript.py"), &fx.config);

            let report = script.report();
            assert!(report.doc.is_some());
            assert!(report.data.is_none());
            assert!(report.requirements.is_some());
            assert!(report.doc_synchronized);
            assert!(serde_json::to_string(&report).unwrap().contains("doc_synchronized"));
        }
    }
}
