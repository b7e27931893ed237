//! Benchmark settings: matrix sizes from the command line, everything else
//! from optional environment variables.

use std::time::Duration;

use cramer_core::device::{ProcessDevice, DEFAULT_MAX_WORKERS};

use crate::error::{BenchError, Result};

pub const ENV_MAX_WORKERS: &str = "CRAMER_MAX_WORKERS";
pub const ENV_WORKER_TIMEOUT_MS: &str = "CRAMER_WORKER_TIMEOUT_MS";
pub const ENV_RESULTS: &str = "CRAMER_RESULTS";
pub const ENV_SEED: &str = "CRAMER_SEED";

pub const DEFAULT_RESULTS: &str = "results.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub sizes: Vec<usize>,
    pub max_workers: usize,
    pub worker_timeout: Option<Duration>,
    pub results_path: String,
    pub seed: Option<u64>,
}

impl BenchConfig {
    /// Builds the configuration from `args` (program name excluded) and a
    /// variable lookup, usually `std::env::var`.
    pub fn from_sources<F>(args: &[String], lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if args.is_empty() {
            return Err(BenchError::Usage(
                "at least one matrix size is required".to_string(),
            ));
        }
        let sizes = args
            .iter()
            .map(|arg| match arg.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(BenchError::InvalidArgument(format!(
                    "matrix size must be a positive integer, got {:?}",
                    arg
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        let max_workers = match lookup(ENV_MAX_WORKERS) {
            Some(v) => parse_positive(ENV_MAX_WORKERS, &v)? as usize,
            None => DEFAULT_MAX_WORKERS,
        };
        let worker_timeout = lookup(ENV_WORKER_TIMEOUT_MS)
            .map(|v| parse_positive(ENV_WORKER_TIMEOUT_MS, &v).map(Duration::from_millis))
            .transpose()?;
        let seed = lookup(ENV_SEED)
            .map(|v| {
                v.parse::<u64>().map_err(|_| {
                    BenchError::InvalidArgument(format!("{} must be an integer, got {:?}", ENV_SEED, v))
                })
            })
            .transpose()?;

        Ok(Self {
            sizes,
            max_workers,
            worker_timeout,
            results_path: lookup(ENV_RESULTS).unwrap_or_else(|| DEFAULT_RESULTS.to_string()),
            seed,
        })
    }

    pub fn device(&self) -> ProcessDevice {
        ProcessDevice::with_params(self.max_workers, self.worker_timeout)
    }
}

fn parse_positive(name: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(BenchError::InvalidArgument(format!(
            "{} must be a positive integer, got {:?}",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = BenchConfig::from_sources(&args(&["200", "400"]), |_| None).unwrap();
        assert_eq!(config.sizes, vec![200, 400]);
        assert_eq!(config.max_workers, DEFAULT_MAX_WORKERS);
        assert_eq!(config.worker_timeout, None);
        assert_eq!(config.results_path, DEFAULT_RESULTS);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_MAX_WORKERS, "3"),
            (ENV_WORKER_TIMEOUT_MS, "1500"),
            (ENV_RESULTS, "out/run.csv"),
            (ENV_SEED, "99"),
        ]
        .into_iter()
        .collect();
        let config =
            BenchConfig::from_sources(&args(&["10"]), |k| env.get(k).map(|v| v.to_string()))
                .unwrap();
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.worker_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.results_path, "out/run.csv");
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.device().max_concurrent_workers, 3);
    }

    #[test]
    fn test_missing_sizes_is_usage_error() {
        let err = BenchConfig::from_sources(&[], |_| None).unwrap_err();
        assert!(matches!(err, BenchError::Usage(_)));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(BenchConfig::from_sources(&args(&["0"]), |_| None).is_err());
        assert!(BenchConfig::from_sources(&args(&["ten"]), |_| None).is_err());
        assert!(BenchConfig::from_sources(&args(&["5"]), |k| {
            (k == ENV_MAX_WORKERS).then(|| "0".to_string())
        })
        .is_err());
    }
}
