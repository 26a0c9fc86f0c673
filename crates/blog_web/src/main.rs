//! Blog server entry point.

use blog_web::{serve, ServerConfig};
use log::error;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = blog_core::init_logging(&config.log_level, config.log_dir.as_deref()) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_stop module=web status=error error={err}");
            ExitCode::FAILURE
        }
    }
}
