use auto_apply::Session;
use clap::Parser;
use std::process::ExitCode;

mod args;
use args::{Args, apply_overrides};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => Session::from_config_file(path),
        None => Session::from_env(),
    };

    // Initialize logging; RUST_LOG still takes precedence
    let verbose = args.verbose || loaded.as_ref().is_ok_and(|s| s.config().verbose);
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let session = match loaded {
        Ok(session) => apply_overrides(&args, session),
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    ::log::info!(
        "Searching for \"{}\", up to {} applications{}",
        session.config().search.query,
        session.config().max_applies,
        if args.dry_run { " (dry run)" } else { "" }
    );

    let start_time = std::time::Instant::now();
    match session.run().await {
        Ok(stats) => {
            ::log::info!(
                "Run complete - {} applications in {:.2} seconds",
                stats.applies_done,
                start_time.elapsed().as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
