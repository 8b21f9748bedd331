//! Test discovery
//!
//! Walks the test root top-down. Inside a directory, files come first in
//! lexicographic order, then each subdirectory in lexicographic order, so the
//! report order never depends on what order the filesystem returns entries.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// What the discoverer looks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRules {
    /// Directory tree to walk
    pub root: PathBuf,
    /// Script extension, without the dot
    pub script_extension: String,
    /// Reference extension, without the dot
    pub reference_extension: String,
}

/// A script and the reference file it is compared against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUnit {
    /// Script file name minus its extension
    pub name: String,
    /// Script path, as found under the test root
    pub script: PathBuf,
    /// `<name>.<reference_extension>` in the script's directory; may not exist
    pub reference: PathBuf,
}

impl DiscoveryRules {
    /// Build the unit for `script`, or `None` if it is not a script.
    pub fn unit_for(&self, script: &Path) -> Option<TestUnit> {
        let file_name = script.file_name()?.to_str()?;
        let name = script_name(file_name, &self.script_extension)?;
        let reference = script.with_file_name(format!("{}.{}", name, self.reference_extension));

        Some(TestUnit {
            name: name.to_string(),
            script: script.to_path_buf(),
            reference,
        })
    }
}

/// Test name for `file_name` if it is `<name>.<extension>` with a non-empty,
/// dot-free `<name>`.
pub fn script_name<'a>(file_name: &'a str, extension: &str) -> Option<&'a str> {
    let name = file_name.strip_suffix(extension)?.strip_suffix('.')?;
    if name.is_empty() || name.contains('.') {
        None
    } else {
        Some(name)
    }
}

/// Lazily enumerate every test unit under `rules.root`.
///
/// Entries that cannot be read are logged and skipped.
pub fn discover(rules: &DiscoveryRules) -> impl Iterator<Item = TestUnit> + '_ {
    WalkDir::new(&rules.root)
        .follow_links(true)
        .sort_by(files_first)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable test entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(move |entry| rules.unit_for(entry.path()))
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn rules(root: &Path) -> DiscoveryRules {
        DiscoveryRules {
            root: root.to_path_buf(),
            script_extension: "lua".to_string(),
            reference_extension: "expect".to_string(),
        }
    }

    fn names(root: &Path) -> Vec<String> {
        discover(&rules(root)).map(|u| u.name).collect()
    }

    #[test]
    fn test_script_name() {
        assert_eq!(script_name("closure.lua", "lua"), Some("closure"));
        assert_eq!(script_name("snake_case-1.lua", "lua"), Some("snake_case-1"));
        assert_eq!(script_name("two.parts.lua", "lua"), None);
        assert_eq!(script_name(".lua", "lua"), None);
        assert_eq!(script_name("closure.expect", "lua"), None);
        assert_eq!(script_name("closurelua", "lua"), None);
        assert_eq!(script_name("closure.lua.bak", "lua"), None);
    }

    #[test]
    fn test_unit_reference_path() {
        let unit = rules(Path::new("tests"))
            .unit_for(Path::new("tests/lang/closure.lua"))
            .unwrap();
        assert_eq!(unit.name, "closure");
        assert_eq!(unit.script, PathBuf::from("tests/lang/closure.lua"));
        assert_eq!(unit.reference, PathBuf::from("tests/lang/closure.expect"));
    }

    #[test]
    fn test_discover_sorted_within_directory() {
        let dir = tempdir().unwrap();
        for name in ["b.lua", "c.lua", "a.lua"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        assert_eq!(names(dir.path()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_discover_files_before_subdirectories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a_sub/deeper")).unwrap();
        fs::create_dir_all(dir.path().join("m_sub")).unwrap();
        fs::write(dir.path().join("z_top.lua"), "").unwrap();
        fs::write(dir.path().join("a_sub/inner.lua"), "").unwrap();
        fs::write(dir.path().join("a_sub/deeper/deep.lua"), "").unwrap();
        fs::write(dir.path().join("m_sub/middle.lua"), "").unwrap();

        assert_eq!(names(dir.path()), vec!["z_top", "inner", "deep", "middle"]);
    }

    #[test]
    fn test_discover_skips_non_scripts() {
        let dir = tempdir().unwrap();
        for name in ["ok.lua", "ok.expect", "README.md", "helper.mod.lua", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("dir.lua")).unwrap();

        assert_eq!(names(dir.path()), vec!["ok"]);
    }

    #[test]
    fn test_discover_does_not_require_reference() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lonely.lua"), "").unwrap();

        let units: Vec<_> = discover(&rules(dir.path())).collect();
        assert_eq!(units.len(), 1);
        assert!(!units[0].reference.exists());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_discover_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"\xff.lua")), "").unwrap();
        fs::write(dir.path().join("ok.lua"), "").unwrap();

        assert_eq!(names(dir.path()), vec!["ok"]);
    }

    #[test]
    #[cfg(unix)]
    fn test_discover_continues_past_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.lua"), "").unwrap();
        fs::write(dir.path().join("ok.lua"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let found = names(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Root can still read the locked directory, so only the readable
        // script's position is fixed.
        assert_eq!(found.first().map(String::as_str), Some("ok"));
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        assert!(names(&dir.path().join("missing")).is_empty());
    }
}
