pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stack;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use error::Failure;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Scan, parse, resolve and execute `source`, printing to `out`.
///
/// Nothing executes if any lexing, parsing or resolution error was
/// reported; those are returned together as [`Failure::Static`].
pub fn run<W: Write>(source: &str, out: W) -> Result<(), Failure> {
    let (tokens, mut errors) = Scanner::new(source).scan_all();

    let mut parser = Parser::new(&tokens);
    let statements = parser.parse();
    errors.extend(parser.into_errors());

    if !errors.is_empty() {
        return Err(Failure::Static(errors));
    }

    let locals = Resolver::new()
        .resolve(&statements)
        .map_err(Failure::Static)?;

    info!("Static checks passed; executing");

    let mut interpreter = Interpreter::new(out);
    interpreter.load_locals(locals);
    interpreter.interpret(&statements).map_err(Failure::Runtime)
}
