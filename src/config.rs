//! Service configuration and environment variable handling.

use crate::error::{Result, TimetableError};
use crate::solver::SolverSettings;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP service listens on
    pub bind_addr: SocketAddr,
    pub solver: SolverSettings,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `TIMETABLE_BIND_ADDR` (optional, default: `127.0.0.1:8080`)
    /// - `TIMETABLE_THREADS` (optional, default: 1): HiGHS thread count
    /// - `TIMETABLE_RANDOM_SEED` (optional, default: 1234)
    /// - `TIMETABLE_TIME_LIMIT_SECS` (optional): positive number of seconds
    /// - `TIMETABLE_SOLVER_LOG` (optional, default: false): HiGHS console log
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SolverSettings::default();

        let bind_addr: SocketAddr = lookup("TIMETABLE_BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|_| {
                TimetableError::Config("TIMETABLE_BIND_ADDR must be a socket address".to_string())
            })?;

        let threads = match lookup("TIMETABLE_THREADS") {
            Some(raw) => raw
                .parse::<i32>()
                .ok()
                .filter(|t| *t > 0)
                .ok_or_else(|| {
                    TimetableError::Config(format!(
                        "TIMETABLE_THREADS must be a positive integer, got '{raw}'"
                    ))
                })?,
            None => defaults.threads,
        };

        let random_seed = match lookup("TIMETABLE_RANDOM_SEED") {
            Some(raw) => raw.parse::<i32>().map_err(|_| {
                TimetableError::Config(format!(
                    "TIMETABLE_RANDOM_SEED must be an integer, got '{raw}'"
                ))
            })?,
            None => defaults.random_seed,
        };

        let time_limit = match lookup("TIMETABLE_TIME_LIMIT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|s| s.is_finite() && *s > 0.0)
                    .ok_or_else(|| {
                        TimetableError::Config(format!(
                            "TIMETABLE_TIME_LIMIT_SECS must be a positive number, got '{raw}'"
                        ))
                    })?;
                Some(Duration::from_secs_f64(secs))
            }
            None => defaults.time_limit,
        };

        let log_to_console = lookup("TIMETABLE_SOLVER_LOG")
            .map(|raw| matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.log_to_console);

        Ok(Self {
            bind_addr,
            solver: SolverSettings {
                threads,
                random_seed,
                time_limit,
                log_to_console,
            },
        })
    }
}
