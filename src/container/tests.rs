// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use super::*;

#[test]
fn test_proper_names() {
    assert!(is_proper_name("yandabase-mpich:latest"));
    assert!(is_proper_name("Australia/Sydney"));
    assert!(!is_proper_name(""));
    assert!(!is_proper_name("yanda base"));
    assert!(!is_proper_name("yanda;rm"));
    assert!(!is_proper_name("tab\there"));
    assert!(!is_proper_name("what?"));
}

#[test]
fn test_parse_mpi_targets() {
    let t: MpiTarget = "mpich".parse().unwrap();
    assert_eq!(t.kind, MpiKind::Mpich);
    assert_eq!(t.version, None);

    let t: MpiTarget = "openmpi".parse().unwrap();
    assert_eq!(t.kind, MpiKind::OpenMpi);
    assert_eq!(t.version, None);

    let t: MpiTarget = "OpenMPI-4.0.2".parse().unwrap();
    assert_eq!(t.kind, MpiKind::OpenMpi);
    assert_eq!(t.version, Some((4, 0, 2)));
    assert_eq!(t.to_string(), "openmpi-4.0.2");

    let t: MpiTarget = "mpich-3.3.2".parse().unwrap();
    assert_eq!(t.to_string(), "mpich-3.3.2");
}

#[test]
fn test_parse_bad_mpi_targets() {
    assert!(matches!(
        "mpi".parse::<MpiTarget>(),
        Err(ContainerError::MpiTooShort(_))
    ));
    assert!(matches!(
        "mpich2".parse::<MpiTarget>(),
        Err(ContainerError::BadMpiName(_))
    ));
    assert!(matches!(
        "intelmpi-1.2.3".parse::<MpiTarget>(),
        Err(ContainerError::BadMpiName(_))
    ));
    assert!(matches!(
        "mpich-3.3".parse::<MpiTarget>(),
        Err(ContainerError::BadMpiVersion { .. })
    ));
    assert!(matches!(
        "openmpi-1.10.7.1".parse::<MpiTarget>(),
        Err(ContainerError::BadMpiVersion { .. })
    ));
    assert!(matches!(
        "openmpi-x.y.z".parse::<MpiTarget>(),
        Err(ContainerError::BadMpiVersion { .. })
    ));
}

#[test]
fn test_image_for_target() {
    let t: MpiTarget = "mpich".parse().unwrap();
    assert_eq!(image_for(&t), "yandabase-mpich:latest");
    assert_eq!(image_for(&t), DEFAULT_DOCKER_IMAGE);

    let t: MpiTarget = "openmpi-2.1.6".parse().unwrap();
    assert_eq!(image_for(&t), "yandabase-openmpi-2.1.6:latest");
}

#[test]
fn test_command() {
    let launch = ContainerLaunch::new(PathBuf::from("/home/me/yandasoft"));
    assert!(launch.validate().is_ok());
    assert_eq!(
        launch.command_string(),
        "docker container run --rm -it -v /home/me/yandasoft:/home/yanda-user/all_yandasoft -e TZ=Australia/Sydney yandabase-mpich:latest /bin/bash"
    );
    let command = launch.command();
    assert_eq!(command[0], "docker");
    assert_eq!(command.last().unwrap(), "/bin/bash");
}

#[test]
fn test_command_with_spaces_in_dir() {
    // No shell is involved, so a space is kept within one argument.
    let launch = ContainerLaunch::new(PathBuf::from("/home/me/my code"));
    assert!(launch.validate().is_ok());
    assert!(launch
        .command()
        .contains(&"/home/me/my code:/home/yanda-user/all_yandasoft".to_string()));
}

#[test]
fn test_validate() {
    let mut launch = ContainerLaunch::new(PathBuf::from("/data"));
    launch.image = "bad image".to_string();
    assert!(matches!(
        launch.validate(),
        Err(ContainerError::BadImageName(_))
    ));
    // Validation happens before docker is ever run.
    assert!(matches!(launch.run(), Err(ContainerError::BadImageName(_))));

    let mut launch = ContainerLaunch::new(PathBuf::from("/data"));
    launch.timezone = String::new();
    assert!(matches!(
        launch.validate(),
        Err(ContainerError::BadTimezone(_))
    ));

    let launch = ContainerLaunch::new(PathBuf::from("relative/dir"));
    assert!(matches!(
        launch.validate(),
        Err(ContainerError::RelativeMountDir(_))
    ));
}

#[test]
fn test_machine_kinds() {
    assert_eq!(MachineKind::parse("generic").unwrap(), MachineKind::Generic);
    assert_eq!(MachineKind::parse(" Galaxy ").unwrap(), MachineKind::Galaxy);
    assert!(matches!(
        MachineKind::parse("magnus"),
        Err(ContainerError::BadMachine(_))
    ));
}

#[test]
fn test_image_targets() {
    let mpich: MpiTarget = "mpich".parse().unwrap();
    let openmpi: MpiTarget = "openmpi-4.0.2".parse().unwrap();

    let targets = image_targets(
        &[MachineKind::Generic, MachineKind::Galaxy, MachineKind::Generic],
        &[mpich, openmpi, mpich],
    );
    assert_eq!(
        targets,
        vec![
            ImageTarget::Generic(mpich),
            ImageTarget::Generic(openmpi),
            ImageTarget::Galaxy
        ]
    );
    assert_eq!(targets[1].to_string(), "openmpi-4.0.2");
    assert_eq!(targets[2].to_string(), "galaxy");

    // Galaxy brings its own MPI.
    assert_eq!(
        image_targets(&[MachineKind::Galaxy], &[openmpi]),
        vec![ImageTarget::Galaxy]
    );
}

fn settings() -> RecipeSettings {
    RecipeSettings {
        git_branch: "develop".to_string(),
        casacore_version: "3.3.0".to_string(),
        num_jobs: 3,
    }
}

#[test]
fn test_default_settings() {
    let s = RecipeSettings::default();
    assert_eq!(s.git_branch, "develop");
    assert_eq!(s.casacore_version, "3.3.0");
    assert!(s.num_jobs >= 1);
}

#[test]
fn test_base_recipe_packaged_mpi() {
    let target = ImageTarget::Generic("mpich".parse().unwrap());
    let recipe = base_recipe(&target, &settings()).unwrap();
    assert_eq!(recipe.recipe_name(), "Dockerfile-yandabase-mpich");
    assert_eq!(recipe.image_name(), "yandabase-mpich:latest");
    assert_eq!(recipe.image_name(), image_for(&"mpich".parse().unwrap()));

    let text = recipe.recipe();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("# This file is automatically created by yanda")
    );
    assert_eq!(lines.next(), Some("FROM ubuntu:bionic as buildenv"));
    assert!(text.contains("RUN apt-get install -y libmpich-dev\n"));
    assert!(!text.contains("mpich.org"));
    assert!(text.contains("        libcppunit-dev \\\n"));
    // The last package ends the command.
    assert!(text.contains("        zeroc-ice-all-runtime\n"));
    assert!(text.contains("casacore/archive/v3.3.0.tar.gz"));
    assert!(text.contains("    && make -j3 \\\n"));
    assert!(text.ends_with("WORKDIR /home/\n"));
}

#[test]
fn test_base_recipe_built_mpi() {
    let target = ImageTarget::Generic("mpich-3.3.2".parse().unwrap());
    let recipe = base_recipe(&target, &settings()).unwrap();
    assert_eq!(recipe.recipe_name(), "Dockerfile-yandabase-mpich-3.3.2");
    let text = recipe.recipe();
    assert!(text.contains(indoc::indoc! {"
        RUN wget https://www.mpich.org/static/downloads/3.3.2/mpich-3.3.2.tar.gz \\
            && tar -zxf mpich-3.3.2.tar.gz \\
            && rm mpich-3.3.2.tar.gz
        WORKDIR /home/mpich-3.3.2
        RUN ./configure --prefix=/usr/local \\
    "}));
    assert!(!text.contains("libmpich-dev"));

    let target = ImageTarget::Generic("openmpi-4.0.2".parse().unwrap());
    let text = base_recipe(&target, &settings()).unwrap().recipe().to_string();
    assert!(text.contains(
        "RUN wget https://download.open-mpi.org/release/open-mpi/v4.0/openmpi-4.0.2.tar.gz \\\n"
    ));
    assert!(text.contains("RUN ./configure --enable-mpi-cxx \\\n"));
    assert!(text.contains("ENV MPI_COMPILE_FLAGS=\"-I/usr/local/include -pthread\"\n"));

    let text = base_recipe(&ImageTarget::Galaxy, &settings())
        .unwrap()
        .recipe()
        .to_string();
    assert!(text.contains("FROM pawsey/mpi-base:latest as buildenv\n"));
    assert!(!text.contains("mpich"));
    assert!(!text.contains("openmpi"));
}

#[test]
fn test_final_recipe() {
    let target = ImageTarget::Generic("openmpi".parse().unwrap());
    let mut settings = settings();
    settings.git_branch = "feature/gridding".to_string();
    let recipe = final_recipe(&target, "yandabase-openmpi:latest", &settings).unwrap();
    assert_eq!(recipe.recipe_name(), "Dockerfile-yandasoft-openmpi");
    assert_eq!(recipe.image_name(), "yandasoft-openmpi:latest");
    let text = recipe.recipe();
    assert!(text.contains("\nFROM yandabase-openmpi:latest as buildenv\n"));
    assert!(text.contains("RUN ./git-do checkout -b feature/gridding\n"));
    assert!(text.contains("-DCMAKE_CXX_COMPILER=mpicxx"));

    let recipe = final_recipe(&ImageTarget::Galaxy, "yandabase-galaxy:latest", &settings).unwrap();
    assert_eq!(recipe.image_name(), "yandasoft-galaxy:latest");
}

#[test]
fn test_recipe_validation() {
    let recipe = || "FROM scratch\n".to_string();
    assert!(DockerRecipe::new("Dockerfile".into(), "a:latest".into(), recipe()).is_ok());
    assert!(matches!(
        DockerRecipe::new("Docker file".into(), "a:latest".into(), recipe()),
        Err(ContainerError::BadRecipeName(_))
    ));
    assert!(matches!(
        DockerRecipe::new(String::new(), "a:latest".into(), recipe()),
        Err(ContainerError::BadRecipeName(_))
    ));
    assert!(matches!(
        DockerRecipe::new("Dockerfile".into(), "a;latest".into(), recipe()),
        Err(ContainerError::BadImageName(_))
    ));
    assert!(matches!(
        DockerRecipe::new("Dockerfile".into(), "a:latest".into(), String::new()),
        Err(ContainerError::EmptyRecipe(_))
    ));
}

#[test]
fn test_build_command() {
    let recipe =
        DockerRecipe::new("Dockerfile-x".into(), "x:latest".into(), "FROM scratch\n".into())
            .unwrap();
    assert_eq!(
        recipe.build_command().join(" "),
        "docker build -t x:latest -f Dockerfile-x ."
    );
}

#[test]
fn test_build_needs_written_recipe() {
    let tmp = tempfile::tempdir().unwrap();
    let recipe =
        DockerRecipe::new("Dockerfile-x".into(), "x:latest".into(), "FROM scratch\n".into())
            .unwrap();
    // docker is never reached.
    assert!(matches!(
        recipe.build(tmp.path()),
        Err(ContainerError::MissingRecipe(_))
    ));

    let path = recipe.write(tmp.path()).unwrap();
    assert_eq!(path, tmp.path().join("Dockerfile-x"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "FROM scratch\n");
}

#[test]
#[cfg(unix)]
#[serial_test::serial]
fn test_build_runs_docker() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::tempdir().unwrap();
    let bin = tmp.path().join("bin");
    std::fs::create_dir(&bin).unwrap();
    let docker = bin.join("docker");
    std::fs::write(
        &docker,
        "#!/bin/sh\necho \"$@\" > docker_args.txt\n[ \"$3\" != bad:latest ]\n",
    )
    .unwrap();
    std::fs::set_permissions(&docker, std::fs::Permissions::from_mode(0o755)).unwrap();

    let old_path = std::env::var_os("PATH").unwrap_or_default();
    let mut paths = vec![bin];
    paths.extend(std::env::split_paths(&old_path));
    std::env::set_var("PATH", std::env::join_paths(paths).unwrap());

    let target = ImageTarget::Generic("mpich".parse().unwrap());
    let recipe = base_recipe(&target, &settings()).unwrap();
    recipe.write(tmp.path()).unwrap();
    let result = recipe.build(tmp.path());
    // The build runs in the recipe's directory.
    let args = std::fs::read_to_string(tmp.path().join("docker_args.txt"));

    let bad = DockerRecipe::new(
        "Dockerfile-bad".into(),
        "bad:latest".into(),
        "FROM scratch\n".into(),
    )
    .unwrap();
    bad.write(tmp.path()).unwrap();
    let bad_result = bad.build(tmp.path());
    std::env::set_var("PATH", old_path);

    assert!(result.is_ok(), "{result:?}");
    assert_eq!(
        args.unwrap(),
        "build -t yandabase-mpich:latest -f Dockerfile-yandabase-mpich .\n"
    );
    assert!(matches!(
        bad_result,
        Err(ContainerError::ContainerFailed { .. })
    ));
}
