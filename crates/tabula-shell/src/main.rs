//! Tabula Shell Entry Point

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tabula_shell::{Backend, Shell, ShellConfig, Step};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: tabula-shell [--config <file.json>] [--memory] [data_dir]";

#[derive(Debug, Error)]
enum ArgsError {
    #[error("{0} needs a value")]
    MissingValue(&'static str),

    #[error("unexpected argument '{0}'")]
    Unexpected(String),

    #[error(transparent)]
    Config(#[from] tabula_core::Error),
}

enum Invocation {
    Run(ShellConfig),
    Help,
    Version,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Invocation, ArgsError> {
    let mut config_file = None;
    let mut memory = false;
    let mut data_dir = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Invocation::Help),
            "-V" | "--version" => return Ok(Invocation::Version),
            "--config" => {
                let path = args.next().ok_or(ArgsError::MissingValue("--config"))?;
                config_file = Some(PathBuf::from(path));
            }
            "--memory" => memory = true,
            other if other.starts_with('-') || data_dir.is_some() => {
                return Err(ArgsError::Unexpected(other.to_string()));
            }
            other => data_dir = Some(PathBuf::from(other)),
        }
    }

    let mut config = match config_file {
        Some(path) => ShellConfig::load(&path)?,
        None => ShellConfig::default(),
    };
    if let Some(dir) = data_dir {
        config = config.data_dir(dir);
    }
    if memory {
        config = config.backend(Backend::Memory);
    }
    Ok(Invocation::Run(config))
}

fn main() {
    let config = match parse_args(std::env::args().skip(1)) {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Help) => {
            println!("{}", USAGE);
            return;
        }
        Ok(Invocation::Version) => {
            println!("tabula-shell {}", Shell::version());
            return;
        }
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    info!("Tabula shell v{}", Shell::version());

    let mut shell = match Shell::open(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open shell: {}", e);
            std::process::exit(1);
        }
    };

    let interactive = io::stdin().is_terminal();
    if interactive {
        println!("Tabula {}. Type .help for help.", Shell::version());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("{}", shell.prompt());
            let _ = io::stdout().flush();
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!("Failed to read input: {}", e);
                break;
            }
            None => break,
        };

        match shell.handle_line(&line) {
            Ok(Step::Output(text)) => println!("{}", text),
            Ok(Step::Pending) => {}
            Ok(Step::Quit) => break,
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    match shell.finish() {
        Ok(Some(text)) => println!("{}", text),
        Ok(None) => {}
        Err(e) => eprintln!("Error: {}", e),
    }

    info!("Goodbye!");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> impl Iterator<Item = String> {
        items.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_positional_data_dir() {
        match parse_args(args(&["/tmp/db"])).unwrap() {
            Invocation::Run(config) => {
                assert_eq!(config.data_dir, PathBuf::from("/tmp/db"));
                assert_eq!(config.backend, Backend::Json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_memory_flag() {
        match parse_args(args(&["--memory"])).unwrap() {
            Invocation::Run(config) => assert_eq!(config.backend, Backend::Memory),
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_args(args(&["--config"])),
            Err(ArgsError::MissingValue("--config"))
        ));
        assert!(matches!(
            parse_args(args(&["a", "b"])),
            Err(ArgsError::Unexpected(_))
        ));
        assert!(matches!(
            parse_args(args(&["--config", "/nonexistent/tabula.json"])),
            Err(ArgsError::Config(_))
        ));
        assert!(matches!(parse_args(args(&["--help"])), Ok(Invocation::Help)));
    }
}
