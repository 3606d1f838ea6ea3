use clap::{Parser, Subcommand};
use kiln::sexpr;
use std::fs;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "WebAssembly code generation toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a WebAssembly text file and print its S-expression tree
    Sexpr {
        /// Path to the text-format module
        file: String,

        /// Exit non-zero if the tree contains parse errors
        #[arg(long)]
        check: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sexpr { file, check } => dump_sexpr(&file, check),
    }
}

fn dump_sexpr(path: &str, check: bool) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: failed to read {path}: {error}");
            return ExitCode::FAILURE;
        }
    };

    let nodes = match sexpr::parse(&source) {
        Ok(nodes) => nodes,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut any_errors = false;
    for node in &nodes {
        println!("{node}");
        any_errors |= node.has_errors();
    }

    if check && any_errors {
        eprintln!("error: tree contains parse errors");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
