use log::error;
use std::process::ExitCode;
use timetable_solver::config::AppConfig;
use timetable_solver::{Result, TimetableInput, server, solve};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

// With a file argument: solve it once and print the report. Otherwise serve.
async fn run() -> Result<()> {
    let config = AppConfig::from_env()?;

    if let Some(path) = std::env::args().nth(1) {
        let raw = std::fs::read_to_string(&path)?;
        let input: TimetableInput = serde_json::from_str(&raw)?;
        let result = solve(&input, &config.solver)?;
        print!("{result}");
        return Ok(());
    }

    server::run_server(config.bind_addr, config.solver).await?;
    Ok(())
}
