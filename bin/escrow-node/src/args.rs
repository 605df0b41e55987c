//! Parses command-line arguments for the escrow node.

use std::path::PathBuf;

use clap::{crate_version, Parser};

#[derive(Debug, Parser)]
#[clap(
    name = "escrow-node",
    about = "Runs a security deposit through its lifecycle between a landlord, a tenant and an issuer",
    version = crate_version!()
)]
pub(crate) struct Cli {
    #[clap(
        long,
        short = 'p',
        help = "The file containing the escrow params",
        default_value = "params.toml"
    )]
    pub params: PathBuf,

    #[clap(
        long,
        short = 'c',
        help = "The file containing the configuration for the node",
        default_value = "config.toml"
    )]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_defaults() {
        Cli::command().debug_assert();

        let cli = Cli::parse_from(["escrow-node"]);
        assert_eq!(cli.params, PathBuf::from("params.toml"));
        assert_eq!(cli.config, PathBuf::from("config.toml"));

        let cli = Cli::parse_from(["escrow-node", "-c", "node.toml", "--params", "gbp.toml"]);
        assert_eq!(cli.params, PathBuf::from("gbp.toml"));
        assert_eq!(cli.config, PathBuf::from("node.toml"));
    }
}
