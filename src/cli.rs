//! Command line interface.

use clap::Parser;

/// Export the collateral backing the active loans at a lending pool tick
/// to a CSV report.
#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct Cli {
    /// The tick id to retrieve data for.
    #[clap(long)]
    pub tick: String,

    /// The path of the CSV report to write.
    #[clap(long, env = "OUTPUT_CSV", default_value = "output.csv")]
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_required() {
        let result = Cli::try_parse_from(["tick-collateral"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_defaults_to_output_csv() {
        let cli = Cli::try_parse_from(["tick-collateral", "--tick", "0xabc-123"]).unwrap();
        assert_eq!(cli.tick, "0xabc-123");
        assert_eq!(cli.output, "output.csv");
    }

    #[test]
    fn test_output_can_be_overridden() {
        let cli = Cli::try_parse_from([
            "tick-collateral",
            "--tick",
            "0xabc-123",
            "--output",
            "/tmp/report.csv",
        ])
        .unwrap();
        assert_eq!(cli.output, "/tmp/report.csv");
    }
}
