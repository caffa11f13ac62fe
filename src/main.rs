use std::fmt::Write as _;
use std::io::{BufRead, IsTerminal, Write};

use commands::ARGS;
use config::CONFIG;
use symbols::itanium::Symbol;
use symbols::TokenStream;

#[macro_export]
macro_rules! exit {
    () => {{
        std::process::exit(0);
    }};

    ($($arg:tt)*) => {{
        eprintln!($($arg)*);
        std::process::exit(1);
    }};
}

/// What became of a single input line.
enum Outcome {
    Demangled(TokenStream),
    Tree(TokenStream, String),
    Failed(String),
}

fn demangle(input: &str, tree: bool) -> Outcome {
    let normalized = symbols::normalize(input);
    let symbol = match Symbol::new(&normalized) {
        Ok(symbol) => symbol,
        Err(err) => return Outcome::Failed(err.to_string()),
    };

    if !tree {
        return Outcome::Demangled(symbol.demangle());
    }

    let mut dump = format!("{:#?}\nsubstitutions:\n", symbol.entity());
    for (idx, entry) in symbol.substitutions().iter().enumerate() {
        let _ = writeln!(dump, "  [{idx}] {entry}");
    }

    Outcome::Tree(symbol.demangle(), dump)
}

fn write_tokens(out: &mut String, stream: &TokenStream, colored: bool) {
    if !colored {
        let _ = write!(out, "{stream}");
        return;
    }

    for token in stream.tokens() {
        let color = CONFIG.colors.get_by_color(token.color);
        let _ = write!(
            out,
            "\x1b[38;2;{};{};{}m{}",
            color.r(),
            color.g(),
            color.b(),
            token.text
        );
    }

    out.push_str("\x1b[0m");
}

fn read_stdin() -> Vec<String> {
    let mut symbols = Vec::new();

    for line in std::io::stdin().lock().lines() {
        match line {
            Ok(line) if line.trim().is_empty() => {}
            Ok(line) => symbols.push(line.trim().to_string()),
            Err(err) => exit!("Failed to read stdin: {err}."),
        }
    }

    symbols
}

fn main() {
    log::set_tracing(ARGS.debug);

    let inputs = if ARGS.symbols.is_empty() {
        read_stdin()
    } else {
        ARGS.symbols.clone()
    };

    let colored = CONFIG.output.color && !ARGS.plain && std::io::stdout().is_terminal();
    let tree = ARGS.tree;

    let mut outcomes = Vec::with_capacity(inputs.len());
    symbols::parallel_compute(&inputs, &mut outcomes, CONFIG.output.threads, |input| {
        demangle(input, tree)
    });

    let mut failed = 0;
    let mut out = String::new();
    for (input, outcome) in inputs.iter().zip(outcomes) {
        match outcome {
            Outcome::Demangled(stream) => write_tokens(&mut out, &stream, colored),
            Outcome::Tree(stream, dump) => {
                write_tokens(&mut out, &stream, colored);
                out.push('\n');
                out.push_str(dump.trim_end());
            }
            Outcome::Failed(err) => {
                failed += 1;
                log::warning!("[main] '{input}': {err}");

                if CONFIG.output.fallback {
                    out.push_str(input);
                } else {
                    let _ = write!(out, "error: '{input}': {err}");
                }
            }
        }

        out.push('\n');
    }

    let mut stdout = std::io::stdout().lock();
    if let Err(err) = stdout.write_all(out.as_bytes()).and_then(|_| stdout.flush()) {
        exit!("Failed to write output: {err}.");
    }

    if ARGS.debug {
        log::notify!("[main] demangled {}/{} symbols.", inputs.len() - failed, inputs.len());
        eprint!("{}", log::logger().drain(std::io::stderr().is_terminal()));
    }

    if failed > 0 {
        std::process::exit(1);
    }
}
