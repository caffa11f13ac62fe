use std::path::PathBuf;

macro_rules! exit {
    ($code:expr => $($arg:tt)*) => {{
        eprintln!($($arg)*);
        std::process::exit($code);
    }};
}

pub const HELP: &str = "OVERVIEW: Demangler for C++ symbols

USAGE: unmangle [options] [SYMBOL...]

Symbols are read line by line from stdin when none are given.

OPTIONS:
  -H, --help          Print usage information
  -C, --config        Path to config used for output
  -B, --debug         Print internal logs to stderr
  -P, --plain         Don't color the output
  -T, --tree          Print the decoded entity and its substitutions";

const ABBRV: &[&str] = &["-H", "-C", "-B", "-P", "-T"];
const NAMES: &[&str] = &["--help", "--config", "--debug", "--plain", "--tree"];

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    /// Symbols given on the command line.
    pub symbols: Vec<String>,

    /// Optional path to config.
    pub config: Option<PathBuf>,

    /// Print internal logs.
    pub debug: bool,

    /// Disable colored output.
    pub plain: bool,

    /// Dump the AST and substitutions table.
    pub tree: bool,
}

/// Why the command line couldn't be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Print the usage, this isn't a failure.
    Help,
    /// Option was given twice.
    Duplicate(&'static str),
    /// Option requires a value that wasn't given.
    MissingValue(&'static str),
    /// Unknown option with the closest known option, if any is close enough.
    Unknown(String, Option<&'static str>),
    /// A file that was named doesn't exist.
    NotFound(PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Help => f.write_str(HELP),
            Error::Duplicate(what) => write!(f, "{what} already given."),
            Error::MissingValue(what) => write!(f, "{what} requires a value."),
            Error::Unknown(unknown, Some(best_guess)) => {
                write!(f, "Unknown cmd arg '{unknown}' did you mean '{best_guess}'?")
            }
            Error::Unknown(unknown, None) => write!(f, "Unknown cmd arg '{unknown}' was entered."),
            Error::NotFound(path) => write!(f, "Config {path:?} does not exist."),
        }
    }
}

impl Cli {
    /// Parse the process's arguments, exiting on anything invalid.
    pub fn parse() -> Self {
        match Self::parse_from(std::env::args().skip(1)) {
            Ok(cli) => cli,
            Err(Error::Help) => exit!(0 => "{HELP}"),
            Err(err) => exit!(1 => "{err}"),
        }
    }

    pub fn parse_from<I: IntoIterator<Item = String>>(args: I) -> Result<Self, Error> {
        let mut cli = Cli::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-H" | "--help" => return Err(Error::Help),
                "-C" | "--config" => {
                    let path = args
                        .next()
                        .filter(|path| !NAMES.contains(&&path[..]) && !ABBRV.contains(&&path[..]))
                        .ok_or(Error::MissingValue("Path to config"))?;

                    if cli.config.is_some() {
                        return Err(Error::Duplicate("Path to config"));
                    }
                    cli.config = Some(PathBuf::from(path));
                }
                "-B" | "--debug" => {
                    if cli.debug {
                        return Err(Error::Duplicate("Debug flag"));
                    }
                    cli.debug = true
                }
                "-P" | "--plain" => {
                    if cli.plain {
                        return Err(Error::Duplicate("Plain flag"));
                    }
                    cli.plain = true
                }
                "-T" | "--tree" => {
                    if cli.tree {
                        return Err(Error::Duplicate("Tree flag"));
                    }
                    cli.tree = true
                }
                unknown if unknown.starts_with('-') && unknown.len() > 1 => {
                    return Err(Error::Unknown(unknown.to_string(), best_guess(unknown)));
                }
                _ => cli.symbols.push(arg),
            }
        }

        cli.validate_args()?;
        Ok(cli)
    }

    fn validate_args(&self) -> Result<(), Error> {
        if let Some(ref cfg) = self.config {
            if !cfg.exists() {
                return Err(Error::NotFound(cfg.clone()));
            }
        }

        Ok(())
    }
}

fn best_guess(unknown: &str) -> Option<&'static str> {
    let mut distance = u32::MAX;
    let mut best_guess = "";
    for name in NAMES {
        let d = triple_accel::levenshtein_exp(unknown.as_bytes(), name.as_bytes());
        if d < distance {
            distance = d;
            best_guess = name;
        }
    }

    // A guess that's less than 3 `steps` away from a correct arg.
    (distance < 4).then_some(best_guess)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, Error> {
        Cli::parse_from(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn symbols_and_flags() {
        let cli = parse(&["-P", "_Z3fooi", "--tree", "_ZN3Foo3BarEv"]).unwrap();

        assert_eq!(cli.symbols, vec!["_Z3fooi", "_ZN3Foo3BarEv"]);
        assert!(cli.plain);
        assert!(cli.tree);
        assert!(!cli.debug);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn duplicate_flags() {
        assert_eq!(parse(&["-B", "--debug"]), Err(Error::Duplicate("Debug flag")));
    }

    #[test]
    fn missing_config() {
        assert_eq!(parse(&["--config"]), Err(Error::MissingValue("Path to config")));
        assert_eq!(parse(&["-C", "-B"]), Err(Error::MissingValue("Path to config")));
        assert_eq!(
            parse(&["-C", "/definitely/not/here.yaml"]),
            Err(Error::NotFound(PathBuf::from("/definitely/not/here.yaml")))
        );
    }

    #[test]
    fn suggestions() {
        assert_eq!(
            parse(&["--plian"]),
            Err(Error::Unknown("--plian".to_string(), Some("--plain")))
        );
        assert_eq!(
            parse(&["--something-else-entirely"]),
            Err(Error::Unknown("--something-else-entirely".to_string(), None))
        );
    }

    #[test]
    fn help() {
        assert_eq!(parse(&["_Z3fooi", "-H"]), Err(Error::Help));
    }
}
