use anyhow::Result;
use colored::Colorize;
use std::io;
use std::process::ExitCode;
use stredit::cli::{self, Args};
use stredit::{edit_files, logger, process_streaming};
use tracing::info;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args()?;

    if let Some(log_path) = logger::init_debug_logging(args.debug)? {
        eprintln!("Debug log: {}", log_path.display());
    }

    execute(args)
}

fn execute(args: Args) -> Result<()> {
    if args.files.is_empty() {
        // pipe mode: stdin through the engine to stdout
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut reader = stdin.lock();
        let mut writer = stdout.lock();
        process_streaming(&mut reader, &mut writer, &args.options)?;
        info!("edited stdin to stdout");
    } else {
        edit_files(&args.files, &args.options)?;
        info!("edited {} file(s) in place", args.files.len());
    }
    Ok(())
}
