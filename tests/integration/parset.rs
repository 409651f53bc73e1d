// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::indoc;
use tempfile::TempDir;

use crate::{get_cmd_output, yanda};

#[test]
fn test_parset_to_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("solver.in");
    let cmd = yanda()
        .args([
            "parset",
            "--prefix",
            "Ccalibrator.solver",
            "--group",
            "LSQR",
            "--set",
            "verbose=true",
            "--set",
            "alpha=1e5",
            "--set",
            "niter=100",
            "--set",
            "tolerance=1.10",
            "-o",
        ])
        .arg(&output)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        indoc! {"
            Ccalibrator.solver.LSQR.verbose = true
            Ccalibrator.solver.LSQR.alpha = 1e5
            Ccalibrator.solver.LSQR.niter = 100
            Ccalibrator.solver.LSQR.tolerance = 1.10
        "}
    );
}

#[test]
fn test_parset_to_stdout_warns_about_repeats() {
    let cmd = yanda()
        .args(["parset", "-p", "Cimager", "-s", "ncycles=0", "-s", "ncycles=3"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, stderr) = get_cmd_output(cmd);
    // Only the parset is on stdout; logging and warnings go to stderr.
    assert_eq!(stdout, "Cimager.ncycles = 3\n");
    assert!(stderr.contains("'ncycles' was set more than once"), "{stderr}");
    assert!(stderr.contains("yanda parset complete"), "{stderr}");
}

#[test]
fn test_parset_values_are_passed_through() {
    let cmd = yanda()
        .args([
            "parset", "-p", "X", "-s", "a=1.10", "-s", "b=infinity", "-s", "c=007", "-s", "d=1.0",
            "-s", "e=false",
        ])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert_eq!(
        stdout,
        indoc! {"
            X.a = 1.10
            X.b = infinity
            X.c = 007
            X.d = 1.0
            X.e = false
        "}
    );
}

#[test]
fn test_gridder_to_stdout() {
    let cmd = yanda()
        .args(["-v", "gridder", "-t", "WStack", "-s", "wmax=35000"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, stderr) = get_cmd_output(cmd);
    assert_eq!(stdout, "Cimager.gridder.WStack.wmax = 35000\n");
    assert!(stderr.contains("yanda gridder"), "{stderr}");
}

#[test]
fn test_parset_needs_key_value() {
    let cmd = yanda()
        .args(["parset", "-p", "Cimager", "-s", "ncycles"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Expected key=value"), "{stderr}");
}

#[test]
fn test_gridder_snapshot_imaging() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("gridder.in");
    let cmd = yanda()
        .args([
            "gridder",
            "--snapshot-imaging",
            "--set",
            "wmax=35000",
            "--output",
        ])
        .arg(&output)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        indoc! {"
            Cimager.gridder.WProject.snapshotimaging = false
            Cimager.gridder.WProject.snapshotimaging.wtolerance = 2600
            Cimager.gridder.WProject.snapshotimaging.longtrack = true
            Cimager.gridder.WProject.snapshotimaging.clipping = 0.01
            Cimager.gridder.WProject.wmax = 35000
        "}
    );
}

#[test]
fn test_gridder_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("gridder.in");
    let cmd = yanda()
        .args([
            "gridder",
            "-t",
            "AWProject",
            "--snapshot-imaging",
            "--dry-run",
            "-o",
        ])
        .arg(&output)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Type: AWProject"), "{stdout}");
    assert!(stdout.contains("Options: 4"), "{stdout}");
    assert!(!output.exists());
}
