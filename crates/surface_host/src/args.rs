//! Command-line argument parsing for the surface host binary

use std::path::PathBuf;

/// Result of parsing command-line arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    pub verbose: bool,
    /// Settings file to use instead of the default location.
    pub config: Option<PathBuf>,
}

/// Parse the process arguments.
pub fn parse_args() -> ParsedArgs {
    parse_from(std::env::args().skip(1))
}

/// Parse `args` (without the program name). Unknown arguments are ignored.
pub fn parse_from(args: impl IntoIterator<Item = String>) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--verbose" => parsed.verbose = true,
            "--config" => match args.next() {
                Some(path) => parsed.config = Some(PathBuf::from(path)),
                None => tracing::warn!("--config expects a path"),
            },
            other => match other.strip_prefix("--config=") {
                Some(path) => parsed.config = Some(PathBuf::from(path)),
                None => tracing::debug!("Ignoring argument {}", other),
            },
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ParsedArgs {
        parse_from(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn test_flags() {
        assert_eq!(parse(&[]), ParsedArgs::default());
        assert!(parse(&["-v"]).verbose);
        assert!(parse(&["--verbose", "extra"]).verbose);
    }

    #[test]
    fn test_config_path() {
        assert_eq!(parse(&["--config", "a.toml"]).config, Some(PathBuf::from("a.toml")));
        assert_eq!(parse(&["--config=b.toml"]).config, Some(PathBuf::from("b.toml")));
        assert_eq!(parse(&["--config"]).config, None);
    }
}
