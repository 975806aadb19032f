//! CLI tool to weave join points into PHP class files.

use std::fs;
use std::process::ExitCode;

use aspect_weaver::{Visibility, Weaver, WeaverConfig, weave_with_report};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn usage() -> ExitCode {
    eprintln!("Usage: weave <command> [options] [files...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  weave    Print the woven source of each file to stdout");
    eprintln!("  methods  List the methods that would be intercepted");
    eprintln!("  check    Check that each file can be woven");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --prefix <prefix>  Prefix for renamed methods (default: _aspectWeaver)");
    eprintln!("  --protected        Reduce renamed methods to protected instead of private");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  weave weave src/Greeter.php");
    eprintln!("  weave methods --protected src/*.php");
    eprintln!("  RUST_LOG=aspect_weaver=debug weave check src/Greeter.php");
    ExitCode::from(2)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("weave=info,aspect_weaver=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        return usage();
    }

    init_tracing();

    let command = args[1].as_str();
    if !matches!(command, "weave" | "methods" | "check") {
        eprintln!("Unknown command: {command}");
        return ExitCode::from(2);
    }

    let mut config = WeaverConfig::default();
    let mut files = Vec::new();
    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--prefix" => {
                let Some(prefix) = rest.next() else {
                    eprintln!("Error: --prefix requires a value");
                    return ExitCode::from(2);
                };
                config = config.prefix(prefix);
            }
            "--protected" => config = config.restricted_visibility(Visibility::Protected),
            _ => files.push(arg.as_str()),
        }
    }

    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let weaver = match Weaver::new(config.clone()) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let mut had_error = false;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };
        debug!(path, bytes = content.len(), "read source");

        match command {
            "weave" => match weave_with_report(&content, config.clone()) {
                Ok((woven, methods)) => {
                    info!(path, methods = methods.len(), "woven");
                    print!("{woven}");
                }
                Err(e) => {
                    eprintln!("{path}: {e} (passed through unchanged)");
                    print!("{content}");
                    had_error = true;
                }
            },
            "methods" => match weaver.analyze(&content) {
                Ok(methods) => {
                    for m in &methods {
                        let modifier = if m.is_static { " static" } else { "" };
                        println!(
                            "{path}:{}: {}{modifier} {} -> {}",
                            m.line, m.visibility, m.name, m.internal_name
                        );
                    }
                    eprintln!("{path}: {} method(s)", methods.len());
                }
                Err(e) => {
                    eprintln!("{path}: {e}");
                    had_error = true;
                }
            },
            _ => match weaver.transform(&content) {
                Ok(_) => eprintln!("{path}: ok"),
                Err(e) => {
                    eprintln!("{path}: {e}");
                    had_error = true;
                }
            },
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
