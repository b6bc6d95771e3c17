use assert_cmd::cargo::cargo_bin_cmd;
use std::{error::Error, fs, path::Path};
use tempfile::tempdir;
use vitals_lib::session::SessionState;

const PASSWORD: &str = "let-me-in";

fn run(state: &Path, action: &str, password: Option<&str>) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("vitals");
    cmd.env("ANALYSIS_PASSWORD", PASSWORD)
        .args(["session", "--action", action, "--state"])
        .arg(state);
    if let Some(password) = password {
        cmd.args(["--password", password]);
    }
    cmd.assert()
}

fn stored(state: &Path) -> Result<SessionState, Box<dyn Error>> {
    Ok(serde_json::from_str(&fs::read_to_string(state)?)?)
}

#[test]
fn login_then_use_until_exhausted() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let state = dir.path().join("session.json");

    run(&state, "use", None).failure();
    assert!(!state.exists());

    run(&state, "login", Some("wrong")).failure();
    run(&state, "login", Some(PASSWORD)).success();
    assert_eq!(
        stored(&state)?,
        SessionState {
            authenticated: true,
            uses_remaining: 3
        }
    );

    for remaining in [2, 1, 0] {
        run(&state, "use", None).success();
        assert_eq!(stored(&state)?.uses_remaining, remaining);
    }
    run(&state, "use", None).failure();
    assert_eq!(stored(&state)?.uses_remaining, 0);

    run(&state, "reset", None).success();
    let after = stored(&state)?;
    assert!(after.authenticated);
    assert_eq!(after.uses_remaining, 3);
    Ok(())
}

#[test]
fn max_uses_comes_from_config() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let state = dir.path().join("session.json");
    let config = dir.path().join("vitals.toml");
    fs::write(
        &config,
        "[session]\nmax_uses = 1\npassword_env = \"VITALS_TEST_SECRET\"\n",
    )?;

    let output = cargo_bin_cmd!("vitals")
        .env("VITALS_TEST_SECRET", PASSWORD)
        .args(["session", "--action", "login", "--password", PASSWORD, "--state"])
        .arg(&state)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let printed: SessionState = serde_json::from_slice(&output)?;
    assert_eq!(printed.uses_remaining, 1);
    Ok(())
}

#[test]
fn missing_password_variable_is_an_error() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let state = dir.path().join("session.json");
    cargo_bin_cmd!("vitals")
        .env_remove("ANALYSIS_PASSWORD")
        .args(["session", "--action", "login", "--password", PASSWORD, "--state"])
        .arg(&state)
        .assert()
        .failure();
    assert!(!state.exists());
    Ok(())
}
