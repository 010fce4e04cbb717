use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_version_flag() -> Result<()> {
    let mut cmd = Command::cargo_bin("dbstrap")?;
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("dbstrap 0.1.0"));
    Ok(())
}

#[test]
fn test_version_subcommand() -> Result<()> {
    let mut cmd = Command::cargo_bin("dbstrap")?;
    cmd.arg("version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("dbstrap 0.1.0"));
    Ok(())
}

#[test]
fn test_help_command() -> Result<()> {
    let mut cmd = Command::cargo_bin("dbstrap")?;
    cmd.arg("--help");
    cmd.assert().success().stdout(predicate::str::contains(
        "Installation and privilege-drop bootstrap",
    ));
    Ok(())
}

#[test]
fn test_install_help() -> Result<()> {
    let mut cmd = Command::cargo_bin("dbstrap")?;
    cmd.arg("install").arg("--help");
    cmd.assert().success().stdout(predicate::str::contains(
        "Install the server from exactly one source",
    ));
    Ok(())
}

#[test]
fn test_su_unknown_user_fails_before_exec() -> Result<()> {
    let mut cmd = Command::cargo_bin("dbstrap")?;
    cmd.arg("su").arg("dbstrap-test-absent").arg("true");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown user"));
    Ok(())
}

#[test]
fn test_su_requires_a_command() -> Result<()> {
    let mut cmd = Command::cargo_bin("dbstrap")?;
    cmd.arg("su").arg("root");
    cmd.assert().failure();
    Ok(())
}

#[test]
fn test_entrypoint_fails_before_drop_when_init_fails() -> Result<()> {
    // A file where a directory must go makes Initializing fail, and the
    // failure has to surface before any exec happens.
    let base = tempdir()?;
    let blocker = base.path().join("blocker");
    std::fs::write(&blocker, b"not a directory")?;
    let dir = blocker.join("data");

    let mut cmd = Command::cargo_bin("dbstrap")?;
    cmd.arg("entrypoint")
        .arg("--data-dir")
        .arg(&dir)
        .arg("--log-dir")
        .arg(&dir)
        .arg("--config-dir")
        .arg(&dir)
        .arg("--client-config-dir")
        .arg(&dir)
        .arg("--")
        .arg("true");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create"));
    Ok(())
}
