//! Scramble CLI entry point

use clap::Parser;
use scramble_cli::cli::usage_exit_code;
use scramble_cli::config::CliOverrides;
use scramble_cli::{Cli, Config, ExitCode, OutputFormat, OutputFormatter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return usage_exit_code(&e).to_exit_code();
        }
    };

    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Config error: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    let overrides = CliOverrides {
        output_format: cli.output.map(|format| format.to_string()),
        verbose: if cli.verbose { Some(true) } else { None },
        debug: if cli.debug { Some(true) } else { None },
    };
    let config = config.with_overrides(&overrides);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let format = config.output.format.parse().unwrap_or(OutputFormat::Table);
    match cli.execute_with_config(&config) {
        Ok(code) => code.to_exit_code(),
        Err(e) => {
            let code = ExitCode::for_error(&e);
            let formatter = OutputFormatter::new(format, false);
            match format {
                OutputFormat::Json => println!("{}", formatter.format_error_with_code(&format!("{e:#}"), code)),
                OutputFormat::Table => eprintln!("{}", formatter.format_error_with_code(&format!("{e:#}"), code)),
                OutputFormat::Quiet => {}
            }
            code.to_exit_code()
        }
    }
}
