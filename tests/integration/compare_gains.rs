// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::indoc;
use tempfile::TempDir;

use crate::{get_cmd_output, make_file_in_dir, yanda};

const GAINS: &str = indoc! {"
    # A comment
    gain.g11.0.0 = [1.0,0.0]
    gain.g11.1.0 = [0.5,0.5]
    gain.g22.0.0 = [1.0,0.0]
    leakage.d12.0.0 = [0.01,-0.02]
"};

// The same as above, but with every g11 phase rotated by 90 degrees.
const ROTATED_GAINS: &str = indoc! {"
    gain.g11.0.0 = [0.0,1.0]
    gain.g11.1.0 = [-0.5,0.5]
    gain.g22.0.0 = [1.0,0.0]
"};

#[test]
fn test_compare_rotated_gains() {
    let tmp = TempDir::new().unwrap();
    let a = make_file_in_dir("result_serial.dat", tmp.path(), GAINS);
    let b = make_file_in_dir("result_parallel.dat", tmp.path(), ROTATED_GAINS);

    let cmd = yanda().arg("compare-gains").arg(&a).arg(&b).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("All 3 solutions agree"), "{stdout}");

    // Without phase referencing, the solutions differ.
    let cmd = yanda()
        .arg("compare-gains")
        .arg(&a)
        .arg(&b)
        .arg("--no-rotate")
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("gain.g11.0.0"), "{stderr}");
}

#[test]
fn test_compare_leakages_with_tolerance() {
    let tmp = TempDir::new().unwrap();
    let a = make_file_in_dir("a.dat", tmp.path(), GAINS);
    let b = make_file_in_dir("b.dat", tmp.path(), "leakage.d12.0.0 = [0.011,-0.02]\n");

    let cmd = yanda()
        .args(["compare-gains", "--key-prefix", "leakage", "--tolerance", "1e-2"])
        .arg(&a)
        .arg(&b)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let cmd = yanda()
        .args(["compare-gains", "--key-prefix", "leakage", "--tolerance", "1e-4"])
        .arg(&a)
        .arg(&b)
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("leakage.d12.0.0"), "{stderr}");
}

#[test]
fn test_compare_gains_missing_in_reference() {
    let tmp = TempDir::new().unwrap();
    let a = make_file_in_dir("a.dat", tmp.path(), GAINS);
    let b = make_file_in_dir("b.dat", tmp.path(), "gain.g11.0.0 = [1.0,0.0]\n");

    let cmd = yanda().arg("compare-gains").arg(&a).arg(&b).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("gain.g11.1.0"), "{stderr}");
}

#[test]
fn test_compare_gains_nothing_to_compare() {
    let tmp = TempDir::new().unwrap();
    let a = make_file_in_dir("a.dat", tmp.path(), "Cimager.ncycles = 0\n");
    let b = make_file_in_dir("b.dat", tmp.path(), GAINS);

    let cmd = yanda().arg("compare-gains").arg(&a).arg(&b).ok();
    assert!(cmd.is_err());
}

#[test]
fn test_compare_gains_malformed() {
    let tmp = TempDir::new().unwrap();
    let a = make_file_in_dir("a.dat", tmp.path(), "gain.g11.0.0 = 1.0,0.0\n");
    let b = make_file_in_dir("b.dat", tmp.path(), GAINS);

    let cmd = yanda().arg("compare-gains").arg(&a).arg(&b).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("line 1"), "{stderr}");
}

#[test]
fn test_gradient_cost_is_reported() {
    let tmp = TempDir::new().unwrap();
    let bandpass = indoc! {"
        gain.g11.0.0.0 = [1.0,0.0]
        gain.g11.0.0.1 = [1.0,0.1]
        gain.g22.0.0.0 = [1.0,0.0]
        gain.g22.0.0.1 = [1.0,0.0]
    "};
    let a = make_file_in_dir("a.dat", tmp.path(), bandpass);
    let b = make_file_in_dir("b.dat", tmp.path(), bandpass);

    let cmd = yanda()
        .args([
            "compare-gains",
            "--num-chans",
            "2",
            "--num-ants",
            "1",
            "--gradient-mode",
            "magphase",
        ])
        .arg(&a)
        .arg(&b)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Gradient cost of"), "{stdout}");
}
