use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, MAIN_SEPARATOR};
use tempfile::tempdir;

// Helper function to create test files
fn create_test_files(dir: impl AsRef<Path>, files: &[&str]) -> Result<()> {
    for name in files {
        let path = dir.as_ref().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, name)?;
    }
    Ok(())
}

/// The binary, isolated from any user or project configuration.
fn finder_cmd(cwd: &Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("finder")?;
    cmd.current_dir(cwd)
        .env("HOME", cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".config"))
        .env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn test_files_first_match() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &["folder1/test1.txt", "folder2/other.txt"])?;

    finder_cmd(dir.path())?
        .args(["files", ".", "-p", r"test1\.txt$"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test1.txt"))
        .stdout(predicate::str::contains("other.txt").not());
    Ok(())
}

#[test]
fn test_files_json_all_with_depth() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &["x.txt", "y/z.txt"])?;

    let output = finder_cmd(dir.path())?
        .args(["files", "-p", ".*", "--all", "-d", "0", "--json"])
        .output()?;
    assert!(output.status.success());

    let paths: Vec<String> = serde_json::from_slice(&output.stdout)?;
    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with("x.txt"));
    Ok(())
}

#[test]
fn test_folders_with_exclusions() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &["build/out.bin", "src/build/gen.rs", "docs/readme.md"])?;

    finder_cmd(dir.path())?
        .args(["folders", "-p", "^build$", "--all", "-x", "build"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    finder_cmd(dir.path())?
        .args(["folders", "-p", "^build$", "--all", "-x", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains(format!("src{}build", MAIN_SEPARATOR)).not());
    Ok(())
}

#[test]
fn test_no_match_is_success() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &["a.txt"])?;

    finder_cmd(dir.path())?
        .args(["files", "-p", "nomatch"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No matches found"));
    Ok(())
}

#[test]
fn test_invalid_pattern_fails() -> Result<()> {
    let dir = tempdir()?;

    finder_cmd(dir.path())?
        .args(["files", "-p", "(broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pattern"));
    Ok(())
}

#[test]
fn test_config_file_supplies_defaults() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &["data/Report.CSV", "data/notes.txt"])?;
    fs::write(
        dir.path().join(".finder.yaml"),
        "root: \"data\"\npattern: \"report\"\ncase_sensitive: false\n",
    )?;

    finder_cmd(dir.path())?
        .args(["files"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report.CSV"));
    Ok(())
}

#[test]
fn test_zip_search() -> Result<()> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let dir = tempdir()?;
    let archive = dir.path().join("bundle.zip");
    let mut writer = zip::ZipWriter::new(fs::File::create(&archive)?);
    writer.start_file("a/b/level2.txt", SimpleFileOptions::default())?;
    writer.write_all(b"deep")?;
    writer.start_file("a/level1.txt", SimpleFileOptions::default())?;
    writer.write_all(b"shallow")?;
    writer.finish()?;

    finder_cmd(dir.path())?
        .args(["files", "bundle.zip", "--zip", "-p", r"level2\.txt$"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bundle.zip/level2.txt"));
    Ok(())
}
