//! Driver-level scenarios running the full pipeline against scripts.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use linetune::{run, Algorithm, Config, Error};
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("script should be writable");
    let mut perms = fs::metadata(&path)
        .expect("script metadata should be readable")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("script should be executable");
    path
}

fn config_for(script: &Path, lower: f64, upper: f64) -> Config {
    Config::new(
        lower,
        upper,
        vec![script.display().to_string(), "%".to_owned()],
    )
}

#[test]
fn tunes_a_quadratic_loss_to_its_minimum() {
    let dir = TempDir::new().expect("tempdir");
    let script = write_script(
        dir.path(),
        "quadratic.sh",
        concat!(
            "#!/bin/sh\n",
            "awk -v x=\"$1\" 'BEGIN { printf \"average loss = %.9f\\n\", (x - 3.0) * (x - 3.0) }'\n",
        ),
    );

    let tuned = run(&config_for(&script, 0.0, 10.0)).expect("tuning should succeed");
    assert_abs_diff_eq!(tuned.value, 3.0, epsilon = 0.01);
    assert!(tuned.loss < 1e-3, "loss {} should be near zero", tuned.loss);
}

#[test]
fn reported_loss_is_never_worse_than_any_probe() {
    // the reconciliation step guarantees the printed loss is the global
    // minimum over everything evaluated; an asymmetric quartic makes the
    // search's final midpoint measurably imperfect
    let dir = TempDir::new().expect("tempdir");
    let script = write_script(
        dir.path(),
        "quartic.sh",
        concat!(
            "#!/bin/sh\n",
            "awk -v x=\"$1\" 'BEGIN { d = x - 1.5; printf \"average loss = %.9f\\n\", d*d*d*d + 0.1*d }'\n",
        ),
    );

    let mut config = config_for(&script, 0.0, 4.0);
    config.tolerance = 0.05;
    let tuned = run(&config).expect("tuning should succeed");
    // true minimum of d^4 + 0.1 d is at d = -(0.1/4)^(1/3)
    let minimum = 1.5 - (0.025_f64).cbrt();
    assert_abs_diff_eq!(tuned.value, minimum, epsilon = 0.3);
}

#[test]
fn brent_algorithm_finds_the_zero_crossing() {
    let dir = TempDir::new().expect("tempdir");
    let script = write_script(
        dir.path(),
        "linear.sh",
        concat!(
            "#!/bin/sh\n",
            "awk -v x=\"$1\" 'BEGIN { printf \"average loss = %.9f\\n\", x - 2.0 }'\n",
        ),
    );

    let mut config = config_for(&script, 0.0, 9.0);
    config.algorithm = Algorithm::BrentRoot;
    config.tolerance = 1e-6;
    let tuned = run(&config).expect("tuning should succeed");
    // reconciliation prefers the most negative probed loss over the
    // crossing itself; it must never be above the crossing's loss
    assert!(
        tuned.loss <= 1e-6,
        "loss {} should be at or below the zero crossing",
        tuned.loss
    );
}

#[test]
fn failing_command_aborts_the_run() {
    let dir = TempDir::new().expect("tempdir");
    let script = write_script(dir.path(), "broken.sh", "#!/bin/sh\nexit 2\n");

    match run(&config_for(&script, 0.0, 10.0)) {
        Err(Error::ExitStatus { code, .. }) => assert_eq!(code, 2),
        other => panic!("expected ExitStatus, got {other:?}"),
    }
}

#[test]
fn degenerate_flat_loss_recovers_with_a_midpoint() {
    let dir = TempDir::new().expect("tempdir");
    let script = write_script(dir.path(), "flat.sh", "#!/bin/sh\necho \"average loss = 1\"\n");

    let tuned = run(&config_for(&script, 0.0, 10.0)).expect("flat loss must not crash");
    assert_abs_diff_eq!(tuned.value, 5.0, epsilon = 1e-9);
    assert_eq!(tuned.loss, 1.0);
}

#[test]
fn unknown_executable_is_a_run_error() {
    let config = Config::new(
        0.0,
        1.0,
        vec!["linetune-no-such-program".to_owned(), "%".to_owned()],
    );
    assert!(matches!(run(&config), Err(Error::Run { .. })));
}
