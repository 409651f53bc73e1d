// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end calibration regression tests. Each test simulates (or unpacks)
//! visibilities, runs ccalibrator one or more times and checks the solutions
//! it writes.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use num_complex::Complex64;

use super::{
    analyse_images, check_tolerance,
    runner::{extract_archive, remove_if_exists},
    CalSolver, RegressionError, RunnerConfig, SynthesisRunner,
};
use crate::{
    constants::*,
    parset::Params,
    solutions::{
        check_gains_near, compare_gain_files, compare_gains, gradient_cost, load_gains,
        GradientMode,
    },
};

/// An empty template for tests that build their parset from scratch.
const SCRATCH_TEMPLATE: &str = "ccal_tmp.in";

/// Image and calibrate uncorrupted and then corrupted visibilities, checking
/// the images and gains, then solve for time-dependent gains and image with
/// them applied.
pub fn calibrator_scenario(
    config: &RunnerConfig,
    template: &Path,
    solver: CalSolver,
) -> Result<(), RegressionError> {
    info!("Calibrator regression test with the {solver} solver");
    let runner = SynthesisRunner::new(template, config.clone())?;
    let result_file = runner.working_dir().join(CAL_RESULT_FILE);

    runner.add_to_parset("Csimulator.corrupt = false")?;
    runner.run_simulator()?;

    runner.init_parset()?;
    runner.run_imager()?;
    analyse_images(&runner)?;

    info!("First run of ccalibrator, should get gains close to (1.,0.)");
    runner.add_to_parset("Ccalibrator.calibaccess = parset")?;
    runner.add_to_parset(&format!("Ccalibrator.solver = {solver}"))?;
    runner.run_calibrator()?;
    let gains = load_gains(&result_file, "gain", true)?;
    check_gains_near(
        &gains,
        Complex64::new(1.0, 0.0),
        UNCORRUPTED_GAIN_TOLERANCE,
    )?;

    // Repeat the simulation, but with corrupted visibilities.
    runner.init_parset()?;
    runner.add_to_parset("Csimulator.corrupt = true")?;
    runner.run_simulator()?;

    info!("Second run of ccalibrator, gains should be close to {MODEL_GAINS_FILE}");
    runner.add_to_parset("Ccalibrator.calibaccess = parset")?;
    runner.add_to_parset(&format!("Ccalibrator.solver = {solver}"))?;
    runner.run_calibrator()?;
    let gains = load_gains(&result_file, "gain", true)?;
    let model = load_gains(runner.working_dir().join(MODEL_GAINS_FILE), "gain", true)?;
    compare_gains(&gains, &model, MODEL_GAIN_TOLERANCE)?;

    // The time-dependent solution itself isn't analysed; the images made
    // with it applied are.
    info!("Third run of ccalibrator. Time-dependent solution for antennagains");
    runner.init_parset()?;
    runner.add_to_parset("Ccalibrator.calibaccess = table")?;
    runner.add_to_parset("Ccalibrator.interval = 600s")?;
    runner.add_to_parset("Ccalibrator.solve = antennagains")?;
    runner.add_to_parset(&format!("Ccalibrator.solver = {solver}"))?;
    remove_if_exists(&runner.working_dir().join(CAL_TABLE))?;
    runner.run_calibrator()?;

    info!("Testing calibration application");
    let mut imager = Params::new("Cimager");
    imager.update("calibrate", true);
    imager.update("calibaccess", "table");
    imager.update("calibaccess.table", format!("\"{CAL_TABLE}\""));
    imager.update("calibrate.ignorebeam", true);
    runner.add_params(&imager)?;
    runner.run_imager()?;
    analyse_images(&runner)?;

    Ok(())
}

/// Calibrate for leakages with uncorrupted and then corrupted visibilities.
pub fn leakage_scenario(
    config: &RunnerConfig,
    template: &Path,
    solver: CalSolver,
) -> Result<(), RegressionError> {
    info!("Leakage regression test with the {solver} solver");
    let runner = SynthesisRunner::new(template, config.clone())?;
    let result_file = runner.working_dir().join(CAL_RESULT_FILE);

    runner.add_to_parset("Csimulator.corrupt = false")?;
    runner.run_simulator()?;

    runner.init_parset()?;
    runner.run_imager()?;
    analyse_images(&runner)?;

    runner.add_to_parset(&format!("Ccalibrator.solver = {solver}"))?;
    runner.run_calibrator()?;
    let leakages = load_gains(&result_file, "leakage", false)?;
    check_gains_near(
        &leakages,
        Complex64::new(0.0, 0.0),
        UNCORRUPTED_LEAKAGE_TOLERANCE,
    )?;

    runner.init_parset()?;
    runner.add_to_parset("Csimulator.corrupt = true")?;
    runner.add_to_parset("Csimulator.corrupt.leakage = true")?;
    runner.run_simulator()?;

    runner.add_to_parset(&format!("Ccalibrator.solver = {solver}"))?;
    runner.run_calibrator()?;
    let leakages = load_gains(&result_file, "leakage", false)?;
    let model = load_gains(
        runner.working_dir().join(MODEL_LEAKAGES_FILE),
        "leakage",
        false,
    )?;
    compare_gains(&leakages, &model, MODEL_LEAKAGE_TOLERANCE)?;

    Ok(())
}

/// Solve for a bandpass with one big (parallel) matrix and with per-channel
/// matrices; both must produce the same solution.
pub fn bandpass_parallel_scenario(
    config: &RunnerConfig,
    archive: &Path,
    num_cycles: usize,
) -> Result<(), RegressionError> {
    info!("Bandpass regression test, serial vs. parallel, {num_cycles} cycles");
    let ms = prepare_measurement_set(config, archive)?;
    let runner = scratch_runner(config)?;

    let mut cal = Params::new("Ccalibrator");
    cal.update("dataset", format!("[{ms}]"));
    cal.update("nAnt", 36);
    cal.update("nBeam", 1);
    cal.update("nChan", 4);
    cal.update("calibaccess", "parset");
    cal.update("calibaccess.parset", CAL_RESULT_FILE);
    cal.update("sources.names", "[field1]");
    cal.update("sources.field1.direction", "[12h30m00.000, -45.00.00.000, J2000]");
    cal.update("sources.field1.components", "[src1]");
    cal.update("sources.src1.flux.i", 1.0);
    cal.update("sources.src1.direction.ra", 0.0);
    cal.update("sources.src1.direction.dec", 0.0);
    cal.update("gridder", "SphFunc");
    cal.update("ncycles", num_cycles);
    cal.update("solve", "bandpass");
    cal.update("solver", CalSolver::Lsqr.to_string());
    cal.update("solver.LSQR.verbose", true);
    runner.add_params(&cal)?;

    info!("Bandpass test: Serial run of ccalibrator");
    let serial = run_and_keep(&runner, 1, "result_serial.dat")?;

    // 4 channels on 5 processes, i.e. 1 channel per worker.
    let mut parallel_params = Params::new("Ccalibrator");
    parallel_params.update("chanperworker", 1);
    parallel_params.update("chunk", "%w");
    parallel_params.update("solver.LSQR.parallelMatrix", true);
    runner.add_params(&parallel_params)?;

    info!("Bandpass test: Parallel run of ccalibrator");
    let parallel = run_and_keep(&runner, 5, "result_parallel.dat")?;

    compare_gain_files(&serial, &parallel, "gain", SERIAL_PARALLEL_TOLERANCE)?;
    Ok(())
}

/// Solve for a smooth bandpass with different numbers of workers; all must
/// produce the same solution.
pub fn smoothness_parallel_scenario(
    config: &RunnerConfig,
    archive: &Path,
) -> Result<(), RegressionError> {
    info!("Bandpass regression test, smoothness constraints with 1, 4 and 10 workers");
    let ms = prepare_measurement_set(config, archive)?;
    let runner = scratch_runner(config)?;
    runner.add_params(&smoothness_params(&ms, true))?;

    let mut results = vec![];
    // (channels per worker, processes); one process is the master.
    for (chan_per_worker, num_procs) in [(40, 2), (10, 5), (4, 11)] {
        info!("Bandpass test: {} worker(s)", num_procs - 1);
        runner.add_to_parset(&format!("Ccalibrator.chanperworker = {chan_per_worker}"))?;
        let result = run_and_keep(
            &runner,
            num_procs,
            &format!("result_smoothing_w{}.dat", num_procs - 1),
        )?;
        results.push(result);
    }

    for (i, a) in results.iter().enumerate() {
        for b in &results[i + 1..] {
            compare_gain_files(a, b, "gain", WORKER_COUNT_TOLERANCE)?;
        }
    }
    Ok(())
}

/// One bandpass solution of the gradient cost test: what to add to the
/// parset, where to keep the result, and the expected frequency-gradient cost
/// of the solution.
struct SmoothnessStep {
    description: &'static str,
    lines: &'static [&'static str],
    result_name: &'static str,
    quantity: &'static str,
    expected_cost: f64,
    tolerance: f64,
}

// Each step adds to the settings of the previous one.
//
// The expected smooth cost differs from the one printed by ccalibrator
// (~0.0545) because of the phase referencing done at the end of calibration,
// which doesn't preserve this kind of gradient. The Laplacian and 4th-order
// solutions are also measured with the gradient, just to have a single number
// to compare.
const SMOOTHNESS_STEPS: [SmoothnessStep; 6] = [
    SmoothnessStep {
        description: "without smoothing constraints",
        lines: &[],
        result_name: "result_nonsmooth.dat",
        quantity: "Nonsmooth gradient cost",
        expected_cost: 22.645816,
        tolerance: 1e-3,
    },
    SmoothnessStep {
        description: "with smoothing constraints (type = 0)",
        lines: &[
            "Ccalibrator.solver.LSQR.smoothing = true",
            "Ccalibrator.solver.LSQR.smoothing.maxWeight = 3.e+6",
            "Ccalibrator.solver.LSQR.smoothing.type = 0",
        ],
        result_name: "result_smooth.dat",
        quantity: "Smooth gradient cost",
        expected_cost: 0.078488,
        tolerance: 1e-5,
    },
    SmoothnessStep {
        description: "with smoothing constraints (type = 2)",
        lines: &[
            "Ccalibrator.solver.LSQR.smoothing.type = 2",
            "Ccalibrator.solver.LSQR.smoothing.accuracy = 2",
        ],
        result_name: "result_smooth2.dat",
        quantity: "Smooth gradient2 cost",
        expected_cost: 0.188401,
        tolerance: 1e-5,
    },
    SmoothnessStep {
        description: "with smoothing constraints (type = 2), accuracy 4",
        lines: &["Ccalibrator.solver.LSQR.smoothing.accuracy = 4"],
        result_name: "result_smooth2_acc4.dat",
        quantity: "Smooth gradient2 acc4 cost",
        expected_cost: 0.833353,
        tolerance: 1e-5,
    },
    SmoothnessStep {
        description: "with smoothing constraints (type = 4)",
        lines: &[
            "Ccalibrator.solver.LSQR.smoothing.type = 4",
            "Ccalibrator.solver.LSQR.smoothing.accuracy = 2",
        ],
        result_name: "result_smooth4.dat",
        quantity: "Smooth gradient4 cost",
        expected_cost: 0.666211,
        tolerance: 1e-5,
    },
    SmoothnessStep {
        description: "with smoothing constraints (type = 4), accuracy 4",
        lines: &["Ccalibrator.solver.LSQR.smoothing.accuracy = 4"],
        result_name: "result_smooth4_acc4.dat",
        quantity: "Smooth gradient4 acc4 cost",
        expected_cost: 1.393525,
        tolerance: 1e-5,
    },
];

/// Solve for a bandpass without and with various smoothness constraints, and
/// check how smooth each solution is.
pub fn smoothness_gradient_cost_scenario(
    config: &RunnerConfig,
    archive: &Path,
) -> Result<(), RegressionError> {
    const NUM_CHANS: usize = 40;
    const NUM_ANTS: usize = 12;
    // All 40 channels on one worker (plus a master rank).
    const NUM_PROCS: usize = 2;

    info!("Bandpass regression test, gradient cost of smoothness constraints");
    let ms = prepare_measurement_set(config, archive)?;
    let runner = scratch_runner(config)?;
    runner.add_params(&smoothness_params(&ms, false))?;
    runner.add_to_parset("Ccalibrator.chanperworker = 40")?;

    let mut results = Vec::with_capacity(SMOOTHNESS_STEPS.len());
    for step in &SMOOTHNESS_STEPS {
        remove_if_exists(&runner.working_dir().join(step.result_name))?;
        for line in step.lines {
            runner.add_to_parset(line)?;
        }
        info!("Bandpass test: {}", step.description);
        results.push(run_and_keep(&runner, NUM_PROCS, step.result_name)?);
    }

    // Report every cost before checking any of them.
    let mut costs = Vec::with_capacity(results.len());
    for (step, result) in SMOOTHNESS_STEPS.iter().zip(results.iter()) {
        let gains = load_gains(result, "gain", true)?;
        let cost = gradient_cost(&gains, NUM_CHANS, NUM_ANTS, GradientMode::ComplexParts)?;
        info!("{} = {cost}", step.quantity);
        costs.push(cost);
    }
    for (step, cost) in SMOOTHNESS_STEPS.iter().zip(costs) {
        check_tolerance(step.quantity, cost, step.expected_cost, step.tolerance)?;
    }
    Ok(())
}

/// Bandpass calibration settings for the 40-channel 1934-638 observation.
fn smoothness_params(ms: &str, smoothing: bool) -> Params {
    let mut cal = Params::new("Ccalibrator");
    cal.update("dataset", format!("[{ms}]"));
    cal.update("nAnt", 12);
    cal.update("nBeam", 1);
    cal.update("nChan", 40);
    cal.update("refantenna", 1);
    cal.update("calibaccess", "parset");
    cal.update("calibaccess.parset", CAL_RESULT_FILE);
    cal.update("sources.names", "[field1]");
    cal.update("sources.field1.direction", "[19h39m25.036, -63.42.45.63, J2000]");
    cal.update("sources.field1.components", "[src]");
    cal.update("sources.src.calibrator", "1934-638");
    cal.update("gridder", "SphFunc");
    cal.update("ncycles", 20);
    cal.update("solve", "bandpass");
    cal.update("solver", CalSolver::Lsqr.to_string());
    cal.update("solver.LSQR.verbose", true);
    cal.update("solver.LSQR.smoothing", smoothing);
    cal.update("solver.LSQR.alpha", "1e5");
    cal.update("solver.LSQR.parallelMatrix", true);
    cal.update("chunk", "%w");
    cal
}

/// Unpack a measurement set archive in the working directory, replacing any
/// old copy. The archive `<name>.tar.bz2` must contain `<name>`, and the
/// measurement set's name is returned.
fn prepare_measurement_set(
    config: &RunnerConfig,
    archive: &Path,
) -> Result<String, RegressionError> {
    let archive = config.working_dir.join(archive);
    let ms = archive
        .file_name()
        .map(|f| f.to_string_lossy().trim_end_matches(".tar.bz2").to_string())
        .unwrap_or_default();
    let ms = if ms.ends_with(".ms") {
        ms
    } else {
        format!("{ms}.ms")
    };
    remove_if_exists(&config.working_dir.join(&ms))?;
    extract_archive(&archive, &config.working_dir)?;
    Ok(ms)
}

/// A runner whose parset starts empty.
fn scratch_runner(config: &RunnerConfig) -> Result<SynthesisRunner, RegressionError> {
    fs::write(config.working_dir.join(SCRATCH_TEMPLATE), "")?;
    SynthesisRunner::new(SCRATCH_TEMPLATE, config.clone())
}

/// Run the calibrator in parallel and move its result out of the way so the
/// next run can't clobber it.
fn run_and_keep(
    runner: &SynthesisRunner,
    num_procs: usize,
    keep_as: &str,
) -> Result<PathBuf, RegressionError> {
    runner.run_calibrator_parallel(num_procs)?;
    let kept = runner.working_dir().join(keep_as);
    fs::rename(runner.working_dir().join(CAL_RESULT_FILE), &kept)?;
    Ok(kept)
}
