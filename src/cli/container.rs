// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Start an interactive Yandasoft development container.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use super::common::InfoPrinter;
use crate::{
    cli::YandaError,
    constants::{CONTAINER_MOUNT_POINT, DEFAULT_DOCKER_IMAGE, DEFAULT_TIMEZONE},
    container::{image_for, ContainerLaunch, MpiTarget},
};

lazy_static::lazy_static! {
    static ref IMAGE_HELP: String =
        format!("The Docker image to run. Default: {DEFAULT_DOCKER_IMAGE}");

    static ref TIMEZONE_HELP: String =
        format!("The timezone inside the container. Default: {DEFAULT_TIMEZONE}");

    static ref DIR_HELP: String =
        format!("The host directory to mount at {CONTAINER_MOUNT_POINT}. Default: the current directory");
}

#[derive(Parser, Debug)]
pub(super) struct ContainerArgs {
    #[clap(short, long, help = DIR_HELP.as_str(), parse(from_os_str))]
    dir: Option<PathBuf>,

    #[clap(short, long, help = IMAGE_HELP.as_str())]
    image: Option<String>,

    /// Use the development image built against this MPI, e.g. "mpich",
    /// "openmpi" or "openmpi-4.0.2".
    #[clap(short, long, conflicts_with = "image")]
    mpi: Option<String>,

    #[clap(short, long, help = TIMEZONE_HELP.as_str())]
    timezone: Option<String>,
}

impl ContainerArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), YandaError> {
        let ContainerArgs {
            dir,
            image,
            mpi,
            timezone,
        } = self;

        let cwd = std::env::current_dir()?;
        let mount_dir = match dir {
            Some(d) if d.is_absolute() => d,
            Some(d) => cwd.join(d),
            None => cwd,
        };
        let mut launch = ContainerLaunch::new(mount_dir);
        if let Some(image) = image {
            launch.image = image;
        } else if let Some(mpi) = mpi {
            let mpi: MpiTarget = mpi.parse()?;
            launch.image = image_for(&mpi);
        }
        if let Some(timezone) = timezone {
            launch.timezone = timezone;
        }
        launch.validate()?;

        let mut printer = InfoPrinter::new("Running Docker container".into());
        printer.push_line(format!("On host: {}", std::env::consts::OS).into());
        printer.push_line(format!("From image: {}", launch.image).into());
        printer.push_line(format!("Mounted directory: {}", launch.mount_dir.display()).into());
        printer.push_block(vec![
            "Using this Docker command:".into(),
            launch.command_string().into(),
        ]);
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        launch.run()?;
        Ok(())
    }
}
