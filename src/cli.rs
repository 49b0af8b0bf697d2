//! Command-line surface of the tuner binary.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::driver::{Config, DEFAULT_TOLERANCE};
use crate::search::Algorithm;

/// Finds the command-line placeholder value that minimizes a reported loss.
///
/// The command template is run once per candidate with every `%` replaced
/// by the candidate value; its output must contain a line of the form
/// `average loss = <number>`. On success the best value and its loss are
/// printed tab-separated to stdout.
#[allow(clippy::module_name_repetitions)]
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "linetune")]
#[command(version)]
pub struct Cli {
    /// Use the bracketing root-finder instead of golden-section search
    #[arg(short, long)]
    pub brent: bool,

    /// Debug-level progress logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Score each candidate on this held-out test set instead of the
    /// training loss
    #[arg(short, long, value_name = "PATH")]
    pub test_set: Option<PathBuf>,

    /// Lower bound of the search range
    #[arg(value_name = "LOWER", allow_hyphen_values = true)]
    pub lower: f64,

    /// Upper bound of the search range
    #[arg(value_name = "UPPER", allow_hyphen_values = true)]
    pub upper: f64,

    /// Optional tolerance in (0, 1), then the command template containing `%`
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true,
        num_args = 1..
    )]
    pub command: Vec<String>,
}

impl Cli {
    /// Resolves the parsed arguments into a driver [`Config`].
    ///
    /// The optional tolerance is peeled off the front of the trailing
    /// arguments: an executable name is never a bare number, so a leading
    /// numeric token must be the tolerance. Range checks happen in
    /// [`crate::run`].
    #[must_use]
    pub fn into_config(self) -> Config {
        let mut command = self.command;
        let mut tolerance = DEFAULT_TOLERANCE;
        if let Some(first) = command.first() {
            if let Ok(value) = first.parse::<f64>() {
                tolerance = value;
                command.remove(0);
            }
        }
        Config {
            lower: self.lower,
            upper: self.upper,
            tolerance,
            command,
            algorithm: if self.brent {
                Algorithm::BrentRoot
            } else {
                Algorithm::GoldenSection
            },
            test_set: self.test_set,
        }
    }
}

/// Parses an explicit argv, mirroring [`Cli::parse`]. Test helper.
///
/// # Errors
///
/// Returns clap's error on malformed arguments.
pub fn parse_args<I, T>(args: I) -> core::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn parses_bounds_and_command() {
        let cli = parse_args(["linetune", "0", "10", "vw", "--l2", "%"]).unwrap();
        assert_eq!(cli.lower, 0.0);
        assert_eq!(cli.upper, 10.0);
        let config = cli.into_config();
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(config.command, ["vw", "--l2", "%"]);
        assert_eq!(config.algorithm, Algorithm::GoldenSection);
    }

    #[test]
    fn peels_leading_tolerance_off_the_command() {
        let cli = parse_args(["linetune", "0", "10", "0.01", "vw", "--l2", "%"]).unwrap();
        let config = cli.into_config();
        assert_eq!(config.tolerance, 0.01);
        assert_eq!(config.command, ["vw", "--l2", "%"]);
    }

    #[test]
    fn out_of_range_tolerance_is_still_peeled() {
        // Range validation is the driver's job; the CLI only disambiguates.
        let cli = parse_args(["linetune", "0", "10", "5", "vw", "%"]).unwrap();
        let config = cli.into_config();
        assert_eq!(config.tolerance, 5.0);
        assert_eq!(config.command, ["vw", "%"]);
    }

    #[test]
    fn negative_bounds_parse() {
        let cli = parse_args(["linetune", "-5.5", "-1", "prog", "%"]).unwrap();
        assert_eq!(cli.lower, -5.5);
        assert_eq!(cli.upper, -1.0);
    }

    #[test]
    fn brent_flag_selects_the_secondary_algorithm() {
        let cli = parse_args(["linetune", "-b", "0", "1", "prog", "%"]).unwrap();
        assert_eq!(cli.into_config().algorithm, Algorithm::BrentRoot);
    }

    #[test]
    fn test_set_flag_is_captured() {
        let cli = parse_args(["linetune", "-t", "held.dat", "0", "1", "prog", "%"]).unwrap();
        assert_eq!(cli.into_config().test_set, Some(PathBuf::from("held.dat")));
    }

    #[test]
    fn command_template_is_required() {
        assert!(parse_args(["linetune", "0", "1"]).is_err());
    }

    #[test]
    fn non_numeric_bounds_are_usage_errors() {
        assert!(parse_args(["linetune", "low", "1", "prog", "%"]).is_err());
    }

    #[test]
    fn hyphenated_template_tokens_are_swallowed() {
        let cli = parse_args(["linetune", "0", "1", "prog", "--loss_function", "%"]).unwrap();
        assert_eq!(cli.command, ["prog", "--loss_function", "%"]);
    }
}
