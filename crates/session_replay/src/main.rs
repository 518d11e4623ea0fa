//! `session_replay` binary entrypoint.

use std::env;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = match session_replay::parse_args(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            session_replay::print_usage();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}");
            session_replay::print_usage();
            return ExitCode::from(2);
        }
    };

    let result = session_replay::run(&options).and_then(|report| report.to_json());
    match result {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}
