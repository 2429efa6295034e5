use clap::Parser;
use srcfetch_cli::opts::LookupOpts;
use std::path::PathBuf;

/// Download the verified sources of a contract.
///
/// The contract can be given as an address, a block explorer URL
/// (e.g. https://etherscan.io/address/0x...) or an aggregator URL
/// (https://<aggregator>/<chain>/<address>).
#[derive(Clone, Debug, Parser)]
#[command(name = "srcfetch", version)]
pub struct Args {
    /// The contract address or explorer URL.
    #[arg(value_name = "CONTRACT")]
    pub contract: String,

    /// The directory to write the sources to.
    ///
    /// Defaults to a directory named after the contract in the current directory.
    #[arg(value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Write into a non-empty directory.
    ///
    /// Identical files are skipped, differing files are written next to the existing ones as
    /// `<name>.conflict<N>.<ext>`.
    #[arg(short, long)]
    pub merge: bool,

    /// Do not print the summary.
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub lookup: LookupOpts,
}
