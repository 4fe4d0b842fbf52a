//! Vertec - the Verte compiler CLI.
//!
//! Usage:
//!   vertec <input>                Compile to ./a.out
//!   vertec <input> -o <output>   Compile to <output>
//!   vertec <input> --print-ast   Print the AST and exit
//!   vertec <input> --print-ir    Print the generated IR and exit

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use lang::codegen::Compiler;
use lang::error::VerteError;
use lang::lexer::lex;
use lang::logger::{self, LogLevel, Logger};
use lang::parser::parse;
use lang::pretty::PrettyPrinter;

/// Compiler for the Verte language.
#[derive(Parser, Debug)]
#[command(name = "vertec")]
#[command(display_name = "Verte")]
#[command(version = concat!("v", env!("CARGO_PKG_VERSION")))]
#[command(about, long_about = None)]
struct Args {
    /// Source file to compile
    input: PathBuf,

    /// Output executable path
    #[arg(short = 'o', default_value = "a.out", value_name = "output")]
    output: PathBuf,

    /// Print the AST and exit
    #[arg(long = "print-ast")]
    print_ast: bool,

    /// Print the generated IR and exit
    #[arg(long = "print-ir")]
    print_ir: bool,

    /// Log verbosity: none, info, debug, warning, error
    #[arg(long = "log-level", default_value = "none", value_parser = parse_log_level)]
    log_level: LogLevel,
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    value.parse()
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::set_level(args.log_level);

    let logger = Logger::new("vertec");
    match run(&args, &logger) {
        Ok(code) => code,
        Err(err) => {
            logger.error(&err.to_string());
            eprintln!("{err}");

            match err {
                VerteError::Io { .. } => ExitCode::from(1),
                _ => ExitCode::from(2),
            }
        }
    }
}

fn run(args: &Args, logger: &Logger) -> Result<ExitCode, VerteError> {
    logger.info(&format!("Reading input file: {}", args.input.display()));
    let source = std::fs::read_to_string(&args.input)
        .map_err(|e| VerteError::io(e.to_string(), &args.input))?;

    // Lex and parse up front; the printing modes stop here.
    let tokens = lex(&source)?;
    let program = parse(tokens)?;

    if args.print_ast {
        print!("{}", PrettyPrinter::render(&program));
        return Ok(ExitCode::SUCCESS);
    }

    let compiler = Compiler::new();

    if args.print_ir {
        let ir = compiler.compile_source_to_ir(&source)?;
        print!("{ir}");
        return Ok(ExitCode::SUCCESS);
    }

    compiler.compile_source_to_executable(&source, &args.output)?;
    logger.info(&format!("Compiled to: {}", args.output.display()));

    Ok(ExitCode::SUCCESS)
}
