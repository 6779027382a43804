use std::{
    fs,
    path::{Path, PathBuf},
};

use strata_config::{Error, Part, Version, bump_at_project_root};
use tempfile::TempDir;

const MANIFEST: &str = "[project]\nname = \"demo\"\nversion = \"1.0.0\"\ndescription = \"A demo\"\n";
const ENTRY_POINT: &str = "\"\"\"Demo package.\"\"\"\n__version__ = \"1.0.0\"\n";

struct Project {
    _temp: TempDir,
    root: PathBuf,
}

impl Project {
    fn new(manifest: Option<&str>, entry_point: Option<&str>) -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp directory");
        let root = temp.path().join("demo");
        fs::create_dir_all(root.join("src").join("demo")).expect("create package dir");

        if let Some(manifest) = manifest {
            fs::write(root.join("pyproject.toml"), manifest).expect("write manifest");
        }
        if let Some(entry_point) = entry_point {
            fs::write(entry_point_path(&root), entry_point).expect("write entry point");
        }

        Self { _temp: temp, root }
    }

    fn manifest(&self) -> String {
        fs::read_to_string(self.root.join("pyproject.toml")).expect("read manifest")
    }

    fn entry_point(&self) -> String {
        fs::read_to_string(entry_point_path(&self.root)).expect("read entry point")
    }
}

fn entry_point_path(root: &Path) -> PathBuf {
    root.join("src").join("demo").join("__init__.py")
}

#[test]
fn test_dry_run_leaves_files_untouched() {
    let project = Project::new(Some(MANIFEST), Some(ENTRY_POINT));

    let version = bump_at_project_root(&project.root, Part::Patch, None, true).expect("dry run");

    assert_eq!(version, Version::new(1, 0, 1));
    assert_eq!(project.manifest(), MANIFEST);
    assert_eq!(project.entry_point(), ENTRY_POINT);
}

#[test]
fn test_bump_rewrites_both_files() {
    let project = Project::new(Some(MANIFEST), Some(ENTRY_POINT));

    let version =
        bump_at_project_root(&project.root, Part::Minor, Some("rc.1"), false).expect("bump");

    assert_eq!(version.to_string(), "1.1.0-rc.1");
    assert_eq!(
        project.manifest(),
        "[project]\nname = \"demo\"\nversion = \"1.1.0-rc.1\"\ndescription = \"A demo\"\n"
    );
    assert_eq!(
        project.entry_point(),
        "\"\"\"Demo package.\"\"\"\n__version__ = \"1.1.0-rc.1\"\n"
    );
}

#[test]
fn test_consecutive_bumps_build_on_each_other() {
    let project = Project::new(Some(MANIFEST), Some(ENTRY_POINT));

    bump_at_project_root(&project.root, Part::Patch, None, false).expect("first bump");
    let version = bump_at_project_root(&project.root, Part::Major, None, false).expect("second");

    assert_eq!(version, Version::new(2, 0, 0));
    assert!(project.entry_point().contains("__version__ = \"2.0.0\""));
}

#[test]
fn test_entry_point_without_assignment_gets_one_prepended() {
    let project = Project::new(Some(MANIFEST), Some("import os\n"));

    bump_at_project_root(&project.root, Part::Patch, None, false).expect("bump");

    assert_eq!(project.entry_point(), "__version__ = \"1.0.1\"\nimport os\n");
}

#[test]
fn test_missing_manifest() {
    let project = Project::new(None, Some(ENTRY_POINT));

    let err = bump_at_project_root(&project.root, Part::Patch, None, false).expect_err("missing");

    assert!(matches!(err, Error::ManifestMissing(_)));
    assert_eq!(project.entry_point(), ENTRY_POINT);
}

#[test]
fn test_missing_entry_point() {
    let project = Project::new(Some(MANIFEST), None);

    let err = bump_at_project_root(&project.root, Part::Patch, None, false).expect_err("missing");

    assert!(matches!(err, Error::EntryPointMissing(ref path) if path == &entry_point_path(&project.root)));
    assert_eq!(project.manifest(), MANIFEST);
}

#[test]
fn test_unrewritable_manifest_leaves_entry_point_alone() {
    // Inline table: parseable, but no `version = "..."` line to substitute.
    let manifest = "project = { name = \"demo\", version = \"1.0.0\" }\n";
    let project = Project::new(Some(manifest), Some(ENTRY_POINT));

    let err = bump_at_project_root(&project.root, Part::Patch, None, false).expect_err("no match");

    assert!(matches!(err, Error::SubstitutionFailed(_)));
    assert_eq!(project.manifest(), manifest);
    assert_eq!(project.entry_point(), ENTRY_POINT);
}

#[test]
fn test_poetry_manifest() {
    let manifest = "[tool.poetry]\nname = \"demo\"\nversion = \"0.3.9\"\n";
    let project = Project::new(Some(manifest), Some(ENTRY_POINT));

    let version = bump_at_project_root(&project.root, Part::Patch, None, false).expect("bump");

    assert_eq!(version, Version::new(0, 3, 10));
    assert_eq!(project.manifest(), "[tool.poetry]\nname = \"demo\"\nversion = \"0.3.10\"\n");
}

#[test]
fn test_manifest_without_version() {
    let project = Project::new(Some("[project]\nname = \"demo\"\n"), Some(ENTRY_POINT));

    let err = bump_at_project_root(&project.root, Part::Patch, None, false).expect_err("no key");

    assert!(matches!(err, Error::VersionKeyMissing(_)));
}

#[test]
fn test_manifest_with_invalid_version() {
    let manifest = "[project]\nname = \"demo\"\nversion = \"1.0\"\n";
    let project = Project::new(Some(manifest), Some(ENTRY_POINT));

    let err = bump_at_project_root(&project.root, Part::Patch, None, false).expect_err("invalid");

    assert!(matches!(err, Error::VersionParse(ref v) if v == "1.0"));
    assert_eq!(project.manifest(), manifest);
}

#[test]
fn test_invalid_prerelease_writes_nothing() {
    let project = Project::new(Some(MANIFEST), Some(ENTRY_POINT));

    let err = bump_at_project_root(&project.root, Part::Patch, Some("not valid!"), false)
        .expect_err("invalid prerelease");

    assert!(matches!(err, Error::InvalidPrerelease(_)));
    assert_eq!(project.manifest(), MANIFEST);
    assert_eq!(project.entry_point(), ENTRY_POINT);
}

#[test]
fn test_overflowing_bump_writes_nothing() {
    let manifest = "[project]\nname = \"demo\"\nversion = \"1.18446744073709551615.0\"\n";
    let project = Project::new(Some(manifest), Some(ENTRY_POINT));

    let err = bump_at_project_root(&project.root, Part::Minor, None, false).expect_err("overflow");

    assert!(matches!(err, Error::VersionOverflow { part: Part::Minor, .. }));
    assert_eq!(project.manifest(), manifest);
    assert_eq!(project.entry_point(), ENTRY_POINT);
}
