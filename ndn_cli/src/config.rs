use clap::{Args, Parser, Subcommand};
use libndn::Name;
use std::path::PathBuf;

/// Named-data networking client.
///
/// Runs a producer and a consumer face connected in-process, to exercise the thread-safe face end to end.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Config {
    /// Path to a YAML face configuration file. Missing values take their defaults.
    #[arg(long = "config-file", short = 'c', env = "NDN_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Express interests under a prefix and report what comes back.
    #[command(name = "fetch", alias = "get")]
    Fetch(FetchCommand),
    /// Print the effective face configuration.
    #[command(name = "config")]
    Config,
}

#[derive(Debug, Args)]
pub struct FetchCommand {
    /// The prefix the producer registers. Interests are expressed for `<prefix>/<n>`.
    #[arg(long = "prefix", short = 'p', default_value = "/example")]
    pub prefix: Name,
    /// How many interests to express.
    #[arg(long = "count", short = 'n', default_value_t = 5)]
    pub count: usize,
    /// Lifetime of each interest, in milliseconds.
    #[arg(long = "lifetime-ms", short = 'l', default_value_t = 1000)]
    pub lifetime_ms: u64,
    /// Have the producer ignore every k-th interest, so that it times out.
    #[arg(long = "drop-every", short = 'd')]
    pub drop_every: Option<usize>,
}

pub struct GlobalOptions {
    pub config_file: Option<PathBuf>,
}

impl Config {
    pub fn to_parts(self) -> (GlobalOptions, CliCommand) {
        let global = GlobalOptions { config_file: self.config_file };
        (global, self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fetch() {
        let config = Config::parse_from(["ndn", "fetch", "--prefix", "/demo/x", "-n", "3", "--drop-every", "2"]);
        let (global, command) = config.to_parts();
        assert!(global.config_file.is_none());
        match command {
            CliCommand::Fetch(cmd) => {
                assert_eq!(cmd.prefix.to_string(), "/demo/x");
                assert_eq!(cmd.count, 3);
                assert_eq!(cmd.lifetime_ms, 1000);
                assert_eq!(cmd.drop_every, Some(2));
            }
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn parse_config() {
        let config = Config::parse_from(["ndn", "-c", "/tmp/face.yml", "config"]);
        let (global, command) = config.to_parts();
        assert_eq!(global.config_file, Some(PathBuf::from("/tmp/face.yml")));
        assert!(matches!(command, CliCommand::Config));
    }
}
