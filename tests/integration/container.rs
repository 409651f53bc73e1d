// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{get_cmd_output, yanda};

#[test]
fn test_container_dry_run() {
    let tmp = TempDir::new().unwrap();
    let cmd = yanda()
        .args(["container", "--dry-run", "--dir"])
        .arg(tmp.path())
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    let expected = format!(
        "docker container run --rm -it -v {}:/home/yanda-user/all_yandasoft -e TZ=Australia/Sydney yandabase-mpich:latest /bin/bash",
        tmp.path().display()
    );
    assert!(stdout.contains(&expected), "{stdout}");
}

#[test]
fn test_container_mpi_image() {
    let cmd = yanda()
        .args([
            "container",
            "--dry-run",
            "--mpi",
            "openmpi-4.0.2",
            "--timezone",
            "Australia/Perth",
        ])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(
        stdout.contains("-e TZ=Australia/Perth yandabase-openmpi-4.0.2:latest /bin/bash"),
        "{stdout}"
    );
}

#[test]
fn test_container_bad_inputs() {
    let cmd = yanda()
        .args(["container", "--dry-run", "--mpi", "openmpi-4.0"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Illegal openmpi version"), "{stderr}");

    let cmd = yanda()
        .args(["container", "--dry-run", "--image", "yanda;rm"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Illegal image name"), "{stderr}");

    // Only one of these makes sense.
    let cmd = yanda()
        .args(["container", "--image", "a:latest", "--mpi", "mpich"])
        .ok();
    assert!(cmd.is_err());
}
