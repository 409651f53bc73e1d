// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Dockerfiles ("recipes") for the Yandasoft images.
//!
//! Each target gets two images: a base image (`yandabase-*`) with the
//! seldom-changing components (OS packages, cmake, MPI, casacore, casarest
//! and LOFAR) and a final image (`yandasoft-*`) with Yandasoft built on top
//! of the base image.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};
use strum_macros::{Display, EnumIter, EnumString};

use super::{is_proper_name, run_command, ContainerError, MpiKind, MpiTarget};

const HEADER: &str = "# This file is automatically created by yanda";
const CMAKE_VERSION: &str = "3.17.3";
const CMAKE_CXX_COMPILER: &str = "-DCMAKE_CXX_COMPILER=mpicxx";
const MPI_DIR: &str = "/usr/local";
const MPI_COMPILE_FLAGS: &str = "-I/usr/local/include -pthread";
const CASAREST_COMMIT: &str = "078f94e";

/// OS packages installed in every base image.
const APT_PACKAGES: [&str; 44] = [
    "g++",
    "gfortran",
    "m4",
    "autoconf",
    "automake",
    "libtool",
    "flex",
    "bison",
    "make",
    "libncurses5-dev",
    "libreadline-dev",
    "libopenblas-dev",
    "liblapacke-dev",
    "libcfitsio-dev",
    "wcslib-dev",
    "libhdf5-serial-dev",
    "libfftw3-dev",
    "libpython-dev",
    "python-pip",
    "python-numpy",
    "python-scipy",
    "libboost-python-dev",
    "libboost-dev",
    "libboost-filesystem-dev",
    "libboost-program-options-dev",
    "libboost-signals-dev",
    "libboost-system-dev",
    "libboost-thread-dev",
    "libboost-regex-dev",
    "libcppunit-dev",
    "git",
    "libffi-dev",
    "libgsl-dev",
    "liblog4cxx-dev",
    "patch",
    "subversion",
    "wget",
    "docker",
    "libxerces-c-dev",
    "libcurl4-openssl-dev",
    "xsltproc",
    "gcovr",
    "zeroc-ice-all-dev",
    "zeroc-ice-all-runtime",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum MachineKind {
    /// Any HPC; the MPI implementation is chosen.
    #[strum(serialize = "generic")]
    Generic,

    /// Pawsey's Galaxy, whose base image comes with Cray MPICH.
    #[strum(serialize = "galaxy")]
    Galaxy,
}

impl MachineKind {
    pub fn parse(s: &str) -> Result<MachineKind, ContainerError> {
        MachineKind::from_str(&s.trim().to_lowercase())
            .map_err(|_| ContainerError::BadMachine(s.to_string()))
    }
}

/// What an image is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    Generic(MpiTarget),
    Galaxy,
}

impl std::fmt::Display for ImageTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageTarget::Generic(mpi) => write!(f, "{mpi}"),
            ImageTarget::Galaxy => write!(f, "{}", MachineKind::Galaxy),
        }
    }
}

/// Every combination of machines and MPI targets. A specific machine has its
/// own MPI, so it makes one target regardless of `mpis`.
pub fn image_targets(machines: &[MachineKind], mpis: &[MpiTarget]) -> Vec<ImageTarget> {
    let mut targets = vec![];
    for machine in machines {
        let new: Vec<ImageTarget> = match machine {
            MachineKind::Generic => mpis.iter().copied().map(ImageTarget::Generic).collect(),
            MachineKind::Galaxy => vec![ImageTarget::Galaxy],
        };
        for target in new {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }
    targets
}

/// Things that vary between builds of the same targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSettings {
    /// The branch of Yandasoft to build.
    pub git_branch: String,
    pub casacore_version: String,
    /// The number of parallel `make` jobs.
    pub num_jobs: usize,
}

impl Default for RecipeSettings {
    fn default() -> Self {
        // Leave a core free if there's more than one.
        let num_cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        RecipeSettings {
            git_branch: "develop".to_string(),
            casacore_version: "3.3.0".to_string(),
            num_jobs: num_cpus.saturating_sub(1).max(1),
        }
    }
}

/// A Dockerfile and the image it makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerRecipe {
    recipe_name: String,
    image_name: String,
    recipe: String,
}

impl DockerRecipe {
    pub fn new(
        recipe_name: String,
        image_name: String,
        recipe: String,
    ) -> Result<DockerRecipe, ContainerError> {
        if !is_proper_name(&recipe_name) {
            return Err(ContainerError::BadRecipeName(recipe_name));
        }
        if !is_proper_name(&image_name) {
            return Err(ContainerError::BadImageName(image_name));
        }
        if recipe.is_empty() {
            return Err(ContainerError::EmptyRecipe(recipe_name));
        }
        Ok(DockerRecipe {
            recipe_name,
            image_name,
            recipe,
        })
    }

    /// The Dockerfile's name.
    pub fn recipe_name(&self) -> &str {
        &self.recipe_name
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// The Dockerfile's contents.
    pub fn recipe(&self) -> &str {
        &self.recipe
    }

    /// Write the Dockerfile into `dir`, replacing any old one.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ContainerError> {
        let path = dir.join(&self.recipe_name);
        debug!("Writing {}", path.display());
        fs::write(&path, &self.recipe).map_err(|err| ContainerError::WriteRecipe {
            file: path.display().to_string(),
            err,
        })?;
        Ok(path)
    }

    pub fn build_command(&self) -> Vec<String> {
        vec![
            "docker".to_string(),
            "build".to_string(),
            "-t".to_string(),
            self.image_name.clone(),
            "-f".to_string(),
            self.recipe_name.clone(),
            ".".to_string(),
        ]
    }

    /// Build the image from the Dockerfile previously written into `dir`.
    pub fn build(&self, dir: &Path) -> Result<(), ContainerError> {
        if !dir.join(&self.recipe_name).is_file() {
            return Err(ContainerError::MissingRecipe(
                dir.join(&self.recipe_name).display().to_string(),
            ));
        }
        info!("Building {}", self.image_name);
        run_command(&self.build_command(), Some(dir))
    }
}

/// Dockerfile text, one line at a time.
#[derive(Default)]
struct RecipeText(Vec<String>);

impl RecipeText {
    fn line<S: Into<String>>(&mut self, line: S) -> &mut Self {
        self.0.push(line.into());
        self
    }

    /// One `RUN` of the commands chained with `&&`.
    fn run(&mut self, commands: &[&str]) -> &mut Self {
        let last = commands.len().saturating_sub(1);
        for (i, command) in commands.iter().enumerate() {
            let start = if i == 0 { "RUN" } else { "    &&" };
            let end = if i == last { "" } else { " \\" };
            self.0.push(format!("{start} {command}{end}"));
        }
        self
    }

    /// Download and unpack a tarball in the current directory.
    fn fetch(&mut self, url: &str, tarball: &str) -> &mut Self {
        self.run(&[
            &format!("wget {url}"),
            &format!("tar -zxf {tarball}"),
            &format!("rm {tarball}"),
        ])
    }

    /// Configure with cmake in a new `build` directory, then build and
    /// install.
    fn cmake_build(&mut self, cmake_args: &str, num_jobs: usize) -> &mut Self {
        self.run(&["mkdir build"])
            .line("WORKDIR build")
            .run(&[
                &format!("cmake {cmake_args} .."),
                &format!("make -j{num_jobs}"),
                "make install",
            ])
    }

    fn finish(&self) -> String {
        let mut text = self.0.join("\n");
        text.push('\n');
        text
    }
}

pub(super) fn base_image_name(target: &ImageTarget) -> String {
    format!("yandabase-{target}:latest")
}

fn final_image_name(target: &ImageTarget) -> String {
    format!("yandasoft-{target}:latest")
}

/// The OS packages and the latest cmake.
fn common_top(text: &mut RecipeText) {
    text.line("ENV DEBIAN_FRONTEND=\"noninteractive\"")
        .line("RUN apt-get update \\")
        .line("    && apt-get upgrade -y \\")
        .line("    && apt-get autoremove -y \\")
        .line("    && apt-get install -y \\");
    for (i, package) in APT_PACKAGES.iter().enumerate() {
        let end = if i + 1 == APT_PACKAGES.len() { "" } else { " \\" };
        text.line(format!("        {package}{end}"));
    }

    let cmake_source = format!("cmake-{CMAKE_VERSION}.tar.gz");
    text.line("# Build the latest cmake")
        .run(&["mkdir /usr/local/share/cmake"])
        .line("WORKDIR /usr/local/share/cmake")
        .fetch(
            &format!(
                "https://github.com/Kitware/CMake/releases/download/v{CMAKE_VERSION}/{cmake_source}"
            ),
            &cmake_source,
        )
        .line(format!("WORKDIR /usr/local/share/cmake/cmake-{CMAKE_VERSION}"))
        .run(&["./bootstrap --system-curl", "make", "make install"]);
}

/// MPI for a generic machine. Without a version, the OS package is used;
/// otherwise it's built from source.
fn mpi_part(text: &mut RecipeText, mpi: &MpiTarget, num_jobs: usize) {
    let (major, minor, patch) = match mpi.version {
        None => {
            let package = match mpi.kind {
                MpiKind::Mpich => "libmpich-dev",
                MpiKind::OpenMpi => "libopenmpi-dev",
            };
            text.run(&[&format!("apt-get install -y {package}")]);
            return;
        }
        Some(v) => v,
    };

    let tarball = format!("{mpi}.tar.gz");
    match mpi.kind {
        MpiKind::Mpich => {
            text.line("# Build MPICH")
                .line("WORKDIR /home")
                .fetch(
                    &format!(
                        "https://www.mpich.org/static/downloads/{major}.{minor}.{patch}/{tarball}"
                    ),
                    &tarball,
                )
                .line(format!("WORKDIR /home/{mpi}"))
                .run(&[
                    &format!("./configure --prefix={MPI_DIR}"),
                    &format!("make -j{num_jobs}"),
                    "make install",
                ])
                .line(format!("ENV PATH=$PATH:{MPI_DIR}/bin"))
                .line(format!("ENV LD_LIBRARY_PATH=$LD_LIBRARY_PATH:{MPI_DIR}/lib"));
        }
        MpiKind::OpenMpi => {
            // The C++ bindings are enabled, as some programs use them.
            text.line("# Build OpenMPI")
                .line("WORKDIR /home")
                .fetch(
                    &format!(
                        "https://download.open-mpi.org/release/open-mpi/v{major}.{minor}/{tarball}"
                    ),
                    &tarball,
                )
                .line(format!("WORKDIR /home/{mpi}"))
                .run(&[
                    "./configure --enable-mpi-cxx",
                    &format!("make all -j{num_jobs}"),
                    "make install",
                ])
                .line("ENV PATH=/usr/local/bin:$PATH")
                .line("ENV LD_LIBRARY_PATH=/usr/local/lib:$LD_LIBRARY_PATH")
                .line("ENV MPI_INCLUDE_PATH=\"/usr/local/include\"")
                .line("ENV MPI_LIBRARIES=\"/usr/local/lib\"")
                .line(format!("ENV MPI_COMPILE_FLAGS=\"{MPI_COMPILE_FLAGS}\""));
        }
    }
}

/// Measures data, casacore, casarest and LOFAR, then the environment.
fn common_bottom(text: &mut RecipeText, settings: &RecipeSettings) {
    let num_jobs = settings.num_jobs;
    let casacore = &settings.casacore_version;
    let release_flags =
        format!("{CMAKE_CXX_COMPILER} -DCMAKE_BUILD_TYPE=Release");
    let lofar_flags = format!(
        "{CMAKE_CXX_COMPILER} -DCMAKE_CXX_FLAGS=\"{MPI_COMPILE_FLAGS}\" -DCMAKE_BUILD_TYPE=Release"
    );

    text.line("# Build the latest measures")
        .run(&[
            "mkdir /usr/local/share/casacore",
            "mkdir /usr/local/share/casacore/data",
        ])
        .line("WORKDIR /usr/local/share/casacore/data")
        .run(&[
            "wget ftp://ftp.astron.nl/outgoing/Measures/WSRT_Measures.ztar",
            "mv WSRT_Measures.ztar WSRT_Measures.tar.gz",
            "tar -zxf WSRT_Measures.tar.gz",
            "rm WSRT_Measures.tar.gz",
            "mkdir /var/lib/jenkins",
            "mkdir /var/lib/jenkins/workspace",
        ])
        .line("# Build casacore")
        .line("WORKDIR /usr/local/share/casacore")
        .fetch(
            &format!("https://github.com/casacore/casacore/archive/v{casacore}.tar.gz"),
            &format!("v{casacore}.tar.gz"),
        )
        .line(format!("WORKDIR /usr/local/share/casacore/casacore-{casacore}"))
        .cmake_build(&release_flags, num_jobs)
        .line("WORKDIR /usr/local/share/casacore/")
        .fetch(
            &format!("https://github.com/steve-ord/casarest/tarball/{CASAREST_COMMIT}"),
            CASAREST_COMMIT,
        )
        .line(format!("WORKDIR steve-ord-casarest-{CASAREST_COMMIT}"))
        .cmake_build(&release_flags, num_jobs)
        .line("WORKDIR /usr/local/share/casacore")
        .run(&[
            "rm -rf casacore",
            &format!("rm -rf steve-ord-casarest-{CASAREST_COMMIT}"),
            "apt-get clean",
        ])
        .line("# Build LOFAR")
        .line("WORKDIR /usr/local/share")
        .run(&["mkdir LOFAR"]);
    for lofar in ["lofar-common", "lofar-blob"] {
        text.line("WORKDIR /usr/local/share/LOFAR")
            .run(&[&format!(
                "git clone https://bitbucket.csiro.au/scm/askapsdp/{lofar}.git"
            )])
            .line(format!("WORKDIR /usr/local/share/LOFAR/{lofar}"))
            .cmake_build(&lofar_flags, num_jobs);
    }

    text.line("# Set environment variables")
        .line("ENV LD_LIBRARY_PATH=/home/install/lib:/usr/local/lib")
        .line("ENV PATH=/home/install/bin:$PATH")
        .line("# Put start-up message in .bashrc");
    let rule = "=".repeat(80);
    for message in [
        String::new(),
        rule.clone(),
        "Welcome to Yandabase container for developers!".to_string(),
        format!("Built by yanda {}", env!("CARGO_PKG_VERSION")),
        rule,
    ] {
        text.line(format!("RUN echo \"echo {message}\" >> ~/.bashrc"));
    }
    // Must stay the last line of .bashrc; the final image removes it.
    text.line("# Protect user from accidental git execution")
        .line("RUN echo \"alias git='echo DO NOT USE GIT INSIDE CONTAINER!'\" >> ~/.bashrc")
        .line("WORKDIR /home/");
}

/// The recipe of the base image of a target.
pub fn base_recipe(
    target: &ImageTarget,
    settings: &RecipeSettings,
) -> Result<DockerRecipe, ContainerError> {
    let mut text = RecipeText::default();
    text.line(HEADER);
    match target {
        ImageTarget::Generic(_) => text.line("FROM ubuntu:bionic as buildenv"),
        ImageTarget::Galaxy => text.line("FROM pawsey/mpi-base:latest as buildenv"),
    };
    common_top(&mut text);
    if let ImageTarget::Generic(mpi) = target {
        mpi_part(&mut text, mpi, settings.num_jobs);
    }
    common_bottom(&mut text, settings);

    DockerRecipe::new(
        format!("Dockerfile-yandabase-{target}"),
        base_image_name(target),
        text.finish(),
    )
}

/// The recipe of the final image of a target, built on `base_image`.
pub fn final_recipe(
    target: &ImageTarget,
    base_image: &str,
    settings: &RecipeSettings,
) -> Result<DockerRecipe, ContainerError> {
    let cmake_args = format!(
        "{CMAKE_CXX_COMPILER} -DCMAKE_CXX_FLAGS=\"{MPI_COMPILE_FLAGS}\" -DCMAKE_BUILD_TYPE=Debug \
         -DIce_HOME=/usr/lib/x86_64-linux-gnu/ -DBUILD_ANALYSIS=ON -DBUILD_PIPELINE=ON \
         -DBUILD_COMPONENTS=ON -DBUILD_SERVICES=OFF \
         -DCMAKE_CXX_FLAGS=\"-coverage\" -DCMAKE_EXE_LINKER_FLAGS=\"-coverage\" \
         -DCMAKE_INSTALL_PREFIX=/builds/ASKAPSDP/install"
    );

    let mut text = RecipeText::default();
    text.line(HEADER)
        .line(format!("FROM {base_image} as buildenv"))
        .line("# Remove the line that prevents git from working")
        .line("RUN head -n -1 ~/.bashrc > temp.txt ; mv temp.txt ~/.bashrc")
        .line("# Build yandasoft")
        .line("WORKDIR /home")
        .run(&["git clone https://github.com/ATNF/all_yandasoft.git"])
        .line("WORKDIR /home/all_yandasoft")
        .run(&["./git-do clone"])
        .run(&[&format!("./git-do checkout -b {}", settings.git_branch)])
        .run(&["mkdir build"])
        .line("WORKDIR /home/all_yandasoft/build")
        .run(&[
            &format!("cmake {cmake_args} .."),
            &format!("make -j{}", settings.num_jobs),
            "make install",
        ])
        .line("# Remove dev tools")
        .run(&["apt-get remove -y git", "apt-get autoremove -y"])
        .line("WORKDIR /home/");

    DockerRecipe::new(
        format!("Dockerfile-yandasoft-{target}"),
        final_image_name(target),
        text.finish(),
    )
}
