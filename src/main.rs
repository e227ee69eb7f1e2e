use std::process::ExitCode;

use loopback_probe::config::{self, Invocation};
use loopback_probe::error::{ConfigError, ExitStatus};
use loopback_probe::{probe, telemetry, VERSION};

fn main() -> ExitCode {
    telemetry::init_telemetry();

    let config = match config::resolve(std::env::args_os()) {
        Ok(Invocation::Version) => {
            println!("{}", VERSION);
            return ExitStatus::Success.into();
        }
        Ok(Invocation::Probe(config)) => config,
        Err(err) => {
            match &err {
                ConfigError::Arguments(clap_err) => {
                    let _ = clap_err.print();
                }
                _ => {
                    eprintln!("{}", err);
                    eprint!("{}", config::usage());
                    eprintln!();
                }
            }
            return err.exit_status().into();
        }
    };

    match probe::execute(&config) {
        Ok(()) => ExitStatus::Success.into(),
        Err(err) => {
            // Not routed through tracing so that RUST_LOG cannot hide it.
            if !config.fail_silently() {
                eprintln!("{:#}", err);
            }
            ExitStatus::Failure.into()
        }
    }
}
