//! Times the sequential and the process-parallel Cramer solvers on random
//! systems and records one CSV row per matrix size.
//!
//! Usage: `cramer-bench size1 size2 ...`

mod config;
mod error;

use std::time::Instant;

use cramer_core::{DenseMatrix, LinearSystem, ProcessDevice, Solution};
use cramer_solver::{solve_parallel, solve_sequential};
use serde::Serialize;

use config::BenchConfig;
use error::{BenchError, Result};

/// One line of the results file.
#[derive(Debug, Clone, Serialize)]
struct BenchRow {
    size: usize,
    seq_time: f64,
    par_time: f64,
    speedup: f64,
}

impl BenchRow {
    /// Builds a row with the results file precision: times to 5 decimals,
    /// speedup to 2. The speedup is taken from the unrounded times.
    fn from_timings(size: usize, seq_time: f64, par_time: f64) -> Self {
        let speedup = if par_time > 0.0 { seq_time / par_time } else { 0.0 };
        Self {
            size,
            seq_time: round_to(seq_time, 5),
            par_time: round_to(par_time, 5),
            speedup: round_to(speedup, 2),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("cramer-bench");
    let config = match BenchConfig::from_sources(&args[1.min(args.len())..], |k| std::env::var(k).ok())
    {
        Ok(config) => config,
        Err(BenchError::Usage(msg)) => {
            eprintln!("{}", msg);
            eprintln!("Usage: {} size1 size2 size3 ...", program);
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        log::error!("Benchmark failed: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &BenchConfig) -> Result<()> {
    let mut rng = match config.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let device = config.device();
    let mut writer = csv::Writer::from_path(&config.results_path)?;

    for &n in &config.sizes {
        log::info!("Running for matrix size {}", n);
        let system = random_system(&mut rng, n)?;
        let row = bench_size(&system, &device)?;

        println!(
            "Seq: {:.3} sec | Par: {:.3} sec | Speedup: {:.2}",
            row.seq_time, row.par_time, row.speedup
        );
        writer.serialize(&row)?;
        writer.flush()?;
    }

    log::info!("Results saved to {}", config.results_path);
    Ok(())
}

/// Entries of `A` and `b` are integers in `0..10`.
fn random_system(rng: &mut fastrand::Rng, n: usize) -> Result<LinearSystem> {
    let a = DenseMatrix::new(n, n, (0..n * n).map(|_| rng.u8(0..10) as f64).collect())?;
    let b = (0..n).map(|_| rng.u8(0..10) as f64).collect();
    Ok(LinearSystem::new(a, b)?)
}

fn bench_size(system: &LinearSystem, device: &ProcessDevice) -> Result<BenchRow> {
    let start = Instant::now();
    let sequential = solve_sequential(system)?;
    let seq_time = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let parallel = solve_parallel(system, device)?;
    let par_time = start.elapsed().as_secs_f64();

    report_solutions(&sequential, &parallel);

    Ok(BenchRow::from_timings(system.n(), seq_time, par_time))
}

fn report_solutions(sequential: &Solution, parallel: &Solution) {
    if sequential.is_singular() {
        log::warn!("No unique solution (det(A) = 0 under the pivot threshold)");
        return;
    }
    let failed = parallel.failed_indices();
    if !failed.is_empty() {
        log::warn!("{} unknowns were not computed by the workers: {:?}", failed.len(), failed);
    }
    let deviation = sequential
        .x
        .iter()
        .zip(&parallel.x)
        .zip(&parallel.per_index_ok)
        .filter(|(_, &ok)| ok)
        .map(|((s, p), _)| (s - p).abs())
        .fold(0.0, f64::max);
    log::info!("Max deviation sequential vs parallel: {:.3e}", deviation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_system_entries_are_small_integers() {
        let mut rng = fastrand::Rng::with_seed(1);
        let system = random_system(&mut rng, 6).unwrap();
        assert_eq!(system.n(), 6);
        assert!(system
            .a()
            .data()
            .iter()
            .chain(system.b())
            .all(|&v| v.fract() == 0.0 && (0.0..10.0).contains(&v)));
    }

    #[test]
    fn test_bench_size_produces_row() {
        let system =
            LinearSystem::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]], vec![3.0, 5.0]).unwrap();
        let row = bench_size(&system, &ProcessDevice::with_params(2, None)).unwrap();
        assert_eq!(row.size, 2);
        assert!(row.seq_time >= 0.0 && row.par_time >= 0.0);
        assert!(row.speedup >= 0.0);
    }

    #[test]
    fn test_csv_header_matches_results_format() {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .serialize(BenchRow {
                size: 4,
                seq_time: 0.5,
                par_time: 0.25,
                speedup: 2.0,
            })
            .unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "size,seq_time,par_time,speedup\n4,0.5,0.25,2.0\n");
    }

    #[test]
    fn test_row_is_rounded_like_the_results_file() {
        let row = BenchRow::from_timings(4, 0.123456789, 0.061728394);
        assert_eq!(row.seq_time, 0.12346);
        assert_eq!(row.par_time, 0.06173);
        assert_eq!(row.speedup, 2.0);

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&row).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "size,seq_time,par_time,speedup\n4,0.12346,0.06173,2.0\n");
    }

    #[test]
    fn test_zero_parallel_time_gives_zero_speedup() {
        let row = BenchRow::from_timings(1, 0.000001, 0.0);
        assert_eq!(row.seq_time, 0.0);
        assert_eq!(row.speedup, 0.0);
    }
}
