// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use tempfile::TempDir;

use crate::{get_cmd_output, yanda};

#[test]
fn test_images_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let cmd = yanda()
        .args([
            "images",
            "--dry-run",
            "--mpi",
            "openmpi-4.0.2",
            "-m",
            "generic",
            "-m",
            "galaxy",
            "-o",
        ])
        .arg(tmp.path())
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    for command in [
        "docker build -t yandabase-openmpi-4.0.2:latest -f Dockerfile-yandabase-openmpi-4.0.2 .",
        "docker build -t yandasoft-openmpi-4.0.2:latest -f Dockerfile-yandasoft-openmpi-4.0.2 .",
        "docker build -t yandabase-galaxy:latest -f Dockerfile-yandabase-galaxy .",
        "docker build -t yandasoft-galaxy:latest -f Dockerfile-yandasoft-galaxy .",
    ] {
        assert!(stdout.contains(command), "{stdout}");
    }
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_images_writes_recipes_without_building() {
    let tmp = TempDir::new().unwrap();
    let cmd = yanda()
        .args(["images", "--git-branch", "master", "-j", "2", "-o"])
        .arg(tmp.path())
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(
        stdout.contains("yandabase-mpich:latest will not be built"),
        "{stdout}"
    );
    assert!(
        stdout.contains("yandasoft-mpich:latest will not be built"),
        "{stdout}"
    );

    let base = fs::read_to_string(tmp.path().join("Dockerfile-yandabase-mpich")).unwrap();
    assert!(base.contains("RUN apt-get install -y libmpich-dev\n"));
    let last = fs::read_to_string(tmp.path().join("Dockerfile-yandasoft-mpich")).unwrap();
    assert!(last.contains("FROM yandabase-mpich:latest as buildenv\n"));
    assert!(last.contains("RUN ./git-do checkout -b master\n"));
    assert!(last.contains("    && make -j2 \\\n"));
}

#[test]
fn test_images_show_targets() {
    let cmd = yanda().args(["images", "--show-targets"]).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Machines: generic, galaxy"), "{stdout}");
    assert!(stdout.contains("MPI: mpich, openmpi"), "{stdout}");
}

#[test]
fn test_images_bad_targets() {
    let cmd = yanda().args(["images", "--dry-run", "-m", "magnus"]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("Unrecognised machine target 'magnus'"),
        "{stderr}"
    );

    let cmd = yanda().args(["images", "--dry-run", "--mpi", "mpi"]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("too short"), "{stderr}");

    let cmd = yanda()
        .args([
            "images",
            "--dry-run",
            "--casacore-version",
            "3.3.0",
            "--mpi",
            "mpich-3.3",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Illegal mpich version '3.3'"), "{stderr}");
}
