// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Write the Dockerfiles of Yandasoft images and optionally build them.

use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;
use log::info;
use strum::IntoEnumIterator;

use super::common::InfoPrinter;
use crate::{
    cli::YandaError,
    container::{
        base_recipe, final_recipe, image_targets, MachineKind, MpiKind, MpiTarget,
        RecipeSettings,
    },
};

lazy_static::lazy_static! {
    static ref MACHINE_HELP: String =
        format!("A machine to make images for. May be given many times. Supported: {}. Default: {}",
            MachineKind::iter().join(", "), MachineKind::Generic);

    static ref MPI_HELP: String =
        format!("An MPI to make generic images with. May be given many times. Supported: {}, or either with a version (e.g. openmpi-4.0.2). Default: {}",
            MpiKind::iter().join(", "), MpiKind::Mpich);

    static ref DEFAULT_SETTINGS: RecipeSettings = RecipeSettings::default();

    static ref GIT_BRANCH_HELP: String =
        format!("The Yandasoft branch built into the final images. Default: {}", DEFAULT_SETTINGS.git_branch);

    static ref CASACORE_HELP: String =
        format!("The casacore version built into the base images. Default: {}", DEFAULT_SETTINGS.casacore_version);

    static ref JOBS_HELP: String =
        format!("The number of parallel make jobs in the images. Default: {}", DEFAULT_SETTINGS.num_jobs);
}

#[derive(Parser, Debug)]
pub(super) struct ImagesArgs {
    #[clap(short, long, help = MACHINE_HELP.as_str())]
    machine: Vec<String>,

    #[clap(long, help = MPI_HELP.as_str())]
    mpi: Vec<String>,

    /// Build the base images. Without this, only their Dockerfiles are
    /// written.
    #[clap(short, long)]
    base: bool,

    /// Build the final images. The base images must already exist.
    #[clap(short, long = "final")]
    final_images: bool,

    /// Print the supported targets and exit.
    #[clap(short, long)]
    show_targets: bool,

    /// The directory the Dockerfiles are written to and the images are built
    /// in. Default: the current directory
    #[clap(short, long, parse(from_os_str))]
    output_dir: Option<PathBuf>,

    #[clap(long, help = GIT_BRANCH_HELP.as_str())]
    git_branch: Option<String>,

    #[clap(long, help = CASACORE_HELP.as_str())]
    casacore_version: Option<String>,

    #[clap(short, long, help = JOBS_HELP.as_str())]
    jobs: Option<usize>,
}

impl ImagesArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), YandaError> {
        let ImagesArgs {
            machine,
            mpi,
            base,
            final_images,
            show_targets,
            output_dir,
            git_branch,
            casacore_version,
            jobs,
        } = self;

        if show_targets {
            let mut printer = InfoPrinter::new("Supported targets".into());
            printer.push_line(format!("Machines: {}", MachineKind::iter().join(", ")).into());
            printer.push_line(
                format!(
                    "MPI: {}, each optionally with a version (e.g. mpich-3.3.2)",
                    MpiKind::iter().join(", ")
                )
                .into(),
            );
            printer.display();
            return Ok(());
        }

        let machines = if machine.is_empty() {
            vec![MachineKind::Generic]
        } else {
            machine
                .iter()
                .map(|m| MachineKind::parse(m))
                .collect::<Result<Vec<_>, _>>()?
        };
        let mpis = if mpi.is_empty() {
            vec![MpiTarget {
                kind: MpiKind::Mpich,
                version: None,
            }]
        } else {
            mpi.iter()
                .map(|m| m.parse())
                .collect::<Result<Vec<MpiTarget>, _>>()?
        };
        let targets = image_targets(&machines, &mpis);

        let mut settings = RecipeSettings::default();
        if let Some(git_branch) = git_branch {
            settings.git_branch = git_branch;
        }
        if let Some(casacore_version) = casacore_version {
            settings.casacore_version = casacore_version;
        }
        if let Some(jobs) = jobs {
            settings.num_jobs = jobs.max(1);
        }
        let dir = match output_dir {
            Some(d) => d,
            None => std::env::current_dir()?,
        };

        // Render every recipe first, so bad names are found before anything
        // is written or built.
        let recipes = targets
            .iter()
            .map(|target| -> Result<_, YandaError> {
                let base_recipe = base_recipe(target, &settings)?;
                let final_recipe = final_recipe(target, base_recipe.image_name(), &settings)?;
                Ok((target, base_recipe, final_recipe))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut printer = InfoPrinter::new("Making Docker images".into());
        printer.push_line(format!("Targets: {}", targets.iter().join(", ")).into());
        printer.push_line(format!("Directory: {}", dir.display()).into());
        printer.push_line(format!("Yandasoft branch: {}", settings.git_branch).into());
        printer.push_line(format!("Casacore version: {}", settings.casacore_version).into());
        printer.push_line(format!("Make jobs: {}", settings.num_jobs).into());
        let mut block = vec!["Build commands:".into()];
        for (_, base_recipe, final_recipe) in &recipes {
            block.push(base_recipe.build_command().join(" ").into());
            block.push(final_recipe.build_command().join(" ").into());
        }
        printer.push_block(block);
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        for (target, base_recipe, final_recipe) in recipes {
            info!("Target {target}");
            for (recipe, build) in [(base_recipe, base), (final_recipe, final_images)] {
                let path = recipe.write(&dir)?;
                info!("Wrote {}", path.display());
                if build {
                    recipe.build(&dir)?;
                } else {
                    info!("{} will not be built", recipe.image_name());
                }
            }
        }

        Ok(())
    }
}
