use clap::Parser;
use nexus_sorter::cli::{Args, run_cli};
use nexus_sorter::output::OutputFormatter;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

const INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let cancel = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(Arc::clone(&cancel));

    match run_cli(&args, cancel) {
        Ok(report) if report.interrupted => ExitCode::from(INTERRUPTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so they don't tear the progress bar. `RUST_LOG` wins
/// over `--verbose`.
fn init_logging(verbose: bool) {
    let default_directive = if verbose { "nexus_sorter=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// First Ctrl-C finishes the current file and stops; the second one exits
/// right away.
fn install_interrupt_handler(cancel: Arc<AtomicBool>) {
    let result = ctrlc::set_handler(move || {
        if cancel.swap(true, Ordering::SeqCst) {
            std::process::exit(i32::from(INTERRUPTED));
        }
        eprintln!("\n⚠ Interrupt received, stopping after the current file...");
    });

    if let Err(e) = result {
        tracing::warn!(error = %e, "Could not install Ctrl-C handler");
    }
}
