use cisp::diagnostics::{emit_runtime_error, emit_syntax_error, report_io_error};
use cisp::language::{lexer::Lexer, parser::parse};
use cisp::Interpreter;
use clap::{ArgAction, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cisp", about = "Interpreter for the cisp rule language", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a program by invoking its `main` rule
    Run {
        file: PathBuf,
        /// Print the value returned by `main`
        #[arg(long)]
        show_result: bool,
    },
    /// Dump the token stream
    Tokens { file: PathBuf },
    /// Dump the parsed program
    Parse { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { file, show_result } => with_source(&file, |source| {
            let program = match parse(source) {
                Ok(program) => program,
                Err(err) => {
                    emit_syntax_error(&file, source, &err);
                    return ExitCode::from(1);
                }
            };
            match Interpreter::new().run(&program) {
                Ok(value) => {
                    if show_result {
                        println!("{value}");
                    }
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    emit_runtime_error(&file, source, &err);
                    ExitCode::from(1)
                }
            }
        }),
        Commands::Tokens { file } => with_source(&file, |source| {
            for token in Lexer::new(source) {
                match token {
                    Ok(token) => println!("{token}"),
                    Err(err) => {
                        emit_syntax_error(&file, source, &err);
                        return ExitCode::from(1);
                    }
                }
            }
            ExitCode::SUCCESS
        }),
        Commands::Parse { file } => with_source(&file, |source| match parse(source) {
            Ok(program) => {
                println!("{program:#?}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                emit_syntax_error(&file, source, &err);
                ExitCode::from(1)
            }
        }),
    }
}

/// Checks the extension and reads `path`, mapping usage and I/O failures to exit status 2.
fn with_source(path: &Path, action: impl FnOnce(&str) -> ExitCode) -> ExitCode {
    if path.extension().and_then(|ext| ext.to_str()) != Some("cisp") {
        eprintln!("Invalid file extension. Only .cisp files are allowed.");
        return ExitCode::from(2);
    }
    match fs::read_to_string(path) {
        Ok(source) => action(&source),
        Err(err) => {
            report_io_error(path, &err);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => std::env::var("CISP_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("cisp=debug"),
        _ => EnvFilter::new("cisp=trace"),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}
