use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::{AstPrinter, RpnPrinter};
use rox::error::{Failure, LoxError};
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Where `--log` writes to
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Emit the token stream as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a single expression, or with `--program` a whole file, and prints its AST
    Parse {
        filename: PathBuf,

        /// Print the expression in reverse Polish notation
        #[arg(long, conflicts_with = "program")]
        rpn: bool,

        /// Parse statements instead of a single expression
        #[arg(long)]
        program: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },
}

/// Maps the file into memory and copies it out as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero-length files cannot be mapped on every platform.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the mapping is read once and copied before the file handle drops;
    // concurrent truncation by another process is outside our control.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let text = std::str::from_utf8(&map)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", text.len(), filename);

    Ok(text)
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn report_all<'e>(errors: impl IntoIterator<Item = &'e LoxError>) {
    for e in errors {
        eprintln!("{}", e);
    }
}

fn tokenize(source: &str, json: bool) -> Result<i32> {
    let (tokens, errors) = Scanner::new(source).scan_all();

    report_all(&errors);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        serde_json::to_writer_pretty(&mut out, &tokens).context("Failed to encode tokens")?;
        writeln!(out)?;
    } else {
        for token in &tokens {
            writeln!(out, "{}", token)?;
        }
    }

    Ok(if errors.is_empty() { 0 } else { 65 })
}

fn parse(source: &str, rpn: bool, program: bool) -> Result<i32> {
    let (tokens, errors) = Scanner::new(source).scan_all();

    if !errors.is_empty() {
        report_all(&errors);
        return Ok(65);
    }

    let mut parser = Parser::new(&tokens);

    if program {
        let statements = parser.parse();

        if parser.had_error() {
            report_all(parser.errors());
            return Ok(65);
        }

        for stmt in &statements {
            println!("{}", AstPrinter::print_stmt(stmt));
        }

        return Ok(0);
    }

    match parser.parse_expression() {
        Ok(expr) if rpn => println!("{}", RpnPrinter::print(&expr)),
        Ok(expr) => println!("{}", AstPrinter::print(&expr)),
        Err(e) => {
            debug!("Parse debug: {}", e);
            eprintln!("{}", e);
            return Ok(65);
        }
    }

    Ok(0)
}

fn evaluate(source: &str) -> Result<i32> {
    let (tokens, errors) = Scanner::new(source).scan_all();

    if !errors.is_empty() {
        report_all(&errors);
        return Ok(65);
    }

    let mut parser = Parser::new(&tokens);

    let expr = match parser.parse_expression() {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(65);
        }
    };

    let mut interpreter = Interpreter::new(io::stdout());

    match interpreter.evaluate(&expr) {
        Ok(value) => {
            println!("{}", value);
            Ok(0)
        }
        Err(e) => {
            debug!("Evaluation debug: {}", e);
            eprintln!("{}", e);
            Ok(70)
        }
    }
}

fn run(source: &str) -> Result<i32> {
    let stdout = io::stdout();

    match rox::run(source, stdout.lock()) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(0)
        }

        Err(Failure::Runtime(LoxError::Io(e))) => {
            Err(e).context("Failed to write program output")
        }

        Err(failure) => {
            debug!("Run failed: {}", failure);
            report_all(failure.errors());
            Ok(failure.exit_code())
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        // Minimal logger so the facade never reports "no logger".
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(&read_file(filename)?, *json)?,

        Commands::Parse {
            filename,
            rpn,
            program,
        } => parse(&read_file(filename)?, *rpn, *program)?,

        Commands::Evaluate { filename } => evaluate(&read_file(filename)?)?,

        Commands::Run { filename } => run(&read_file(filename)?)?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
