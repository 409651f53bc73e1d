// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::{formatdoc, indoc};
use tempfile::TempDir;

use crate::{get_cmd_output, make_file_in_dir, yanda};

#[test]
fn test_regression_dry_run() {
    let tmp = TempDir::new().unwrap();
    let cmd = yanda()
        .args(["regression", "--dry-run", "--suite", "leakage", "--working-dir"])
        .arg(tmp.path())
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("leakage regression tests"), "{stdout}");
    assert!(stdout.contains("Solvers: SVD, LSQR"), "{stdout}");
    assert!(stdout.contains("leakagecalibtest_template.in"), "{stdout}");
}

#[test]
fn test_regression_bad_arguments() {
    let cmd = yanda()
        .args(["regression", "--dry-run", "--suite", "imaging"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Unknown regression suite 'imaging'"), "{stderr}");

    let cmd = yanda()
        .args(["regression", "--dry-run", "--solver", "svd"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Unknown calibration solver 'svd'"), "{stderr}");

    let cmd = yanda()
        .args(["regression", "--dry-run", "--suite", "leakage", "--parallel"])
        .ok();
    assert!(cmd.is_err());
}

#[test]
fn test_regression_arguments_file() {
    let tmp = TempDir::new().unwrap();
    let args_file = make_file_in_dir(
        "regression.toml",
        tmp.path(),
        &formatdoc! {r#"
            suite = "leakage"
            solver = "LSQR"
            calibrator = "/opt/yandasoft/bin/ccalibrator"
            working_dir = "{}"
        "#,
            tmp.path().display()
        },
    );
    let saved = tmp.path().join("saved.toml");

    // The CLI overrides the file.
    let cmd = yanda()
        .args(["regression", "--dry-run", "--solver", "SVD", "--save-toml"])
        .arg(&saved)
        .arg(&args_file)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("leakage regression tests"), "{stdout}");
    assert!(stdout.contains("Solvers: SVD"), "{stdout}");
    assert!(!stdout.contains("LSQR"), "{stdout}");
    assert!(
        stdout.contains("Calibrator: /opt/yandasoft/bin/ccalibrator"),
        "{stdout}"
    );

    let saved = std::fs::read_to_string(saved).unwrap();
    assert!(saved.contains("suite = \"leakage\""), "{saved}");
    assert!(saved.contains("solver = \"SVD\""), "{saved}");
}

#[test]
fn test_regression_unknown_arguments_file_type() {
    let tmp = TempDir::new().unwrap();
    let args_file = make_file_in_dir("regression.yaml", tmp.path(), "suite: leakage\n");
    let cmd = yanda()
        .args(["regression", "--dry-run"])
        .arg(&args_file)
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("toml, json"), "{stderr}");
}

#[cfg(unix)]
#[test]
fn test_regression_runs_executables() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    make_file_in_dir(
        "calibratortest_template.in",
        tmp.path(),
        "Csimulator.dataset = 10uJy.ms\n",
    );
    make_file_in_dir(
        "rndgains.in",
        tmp.path(),
        indoc! {"
            gain.g11.0.0 = [0.9,0.1]
            gain.g11.1.0 = [1.1,-0.2]
        "},
    );
    let scripts = [
        ("csimulator", "exit 0"),
        (
            "cimager",
            "mkdir -p image.field1.restored image.field1 psf.field1 weights.field1 residual.field1",
        ),
        (
            "imgstat",
            r#"case "$1" in
    image.field1.restored|image.field1) echo "1.0 -172.177176 -44.770360 0.05 0.0" ;;
    psf.field1) echo "1.0 -172.5 -45.0 0.1 0.0" ;;
    weights.field1|residual.field1) echo "0.0 0.0 0.0 0.0 0.0" ;;
esac"#,
        ),
        (
            "ccalibrator",
            r#"if grep -q "Csimulator.corrupt = true" "$2"; then
    cp rndgains.in result.dat
else
    printf 'gain.g11.0.0 = [1.0,0.0]\ngain.g11.1.0 = [0.99,0.01]\n' > result.dat
fi"#,
        ),
    ];
    for (name, body) in scripts {
        let path = make_file_in_dir(name, tmp.path(), &format!("#!/bin/sh\n{body}\n"));
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    let cmd = yanda()
        .args(["regression", "--solver", "LSQR", "--working-dir"])
        .arg(tmp.path())
        .arg("--simulator")
        .arg(tmp.path().join("csimulator"))
        .arg("--imager")
        .arg(tmp.path().join("cimager"))
        .arg("--calibrator")
        .arg(tmp.path().join("ccalibrator"))
        .arg("--image-stats")
        .arg(tmp.path().join("imgstat"))
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(
        stdout.contains("All calibrator regression tests passed"),
        "{stdout}"
    );
    // The last calibration asked for a time-dependent solution.
    let parset = std::fs::read_to_string(tmp.path().join("temp_parset.in")).unwrap();
    assert!(parset.contains("Ccalibrator.solve = antennagains"), "{parset}");
    assert!(parset.contains("Cimager.calibrate = true"), "{parset}");
    assert!(
        stdout.contains("Statistics for residual.field1"),
        "{stdout}"
    );
}

#[test]
fn test_regression_missing_executable() {
    let tmp = TempDir::new().unwrap();
    make_file_in_dir(
        "leakagecalibtest_template.in",
        tmp.path(),
        "Csimulator.dataset = 10uJy.ms\n",
    );
    let cmd = yanda()
        .args([
            "regression",
            "--suite",
            "leakage",
            "--simulator",
            "/this/does/not/exist/csimulator",
            "--working-dir",
        ])
        .arg(tmp.path())
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("/this/does/not/exist/csimulator -c temp_parset.in"),
        "{stderr}"
    );
}
