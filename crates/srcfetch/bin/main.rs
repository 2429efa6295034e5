#[macro_use]
extern crate tracing;

use clap::Parser;
use eyre::{Result, WrapErr};
use srcfetch::{Download, MaterializationPolicy, Resolver, SourceApiClient};
use srcfetch_cli::{handler, utils};
use yansi::Paint;

mod args;

use args::Args;

fn main() -> Result<()> {
    handler::install();
    utils::subscriber();
    utils::enable_paint();
    let args = Args::parse();
    main_args(args)
}

#[tokio::main]
async fn main_args(args: Args) -> Result<()> {
    let config = args.lookup.load_config()?;
    trace!(?config, "loaded config");

    let registry = config.chain_registry().wrap_err("failed to load chain registry")?;
    let resolver = Resolver::new(registry, config.aggregator_host.clone());
    let client = SourceApiClient::from_config(&config)?;

    let policy = if args.merge || config.merge {
        MaterializationPolicy::Merge
    } else {
        MaterializationPolicy::Strict
    };
    let downloaded = Download {
        reference: &args.contract,
        default_chain: &config.default_chain,
        directory: args.directory,
        policy,
    }
    .run(&resolver, &client)
    .await?;

    if !args.quiet {
        let name = downloaded.contract_name.as_deref().unwrap_or(&downloaded.target.address);
        println!(
            "{} {name} ({}) to {}: {}",
            "Wrote".green(),
            downloaded.chain,
            downloaded.directory.display(),
            downloaded.report
        );
        for (original, written) in downloaded.report.conflicts() {
            println!(
                "  {} {} differs, new content in {}",
                "conflict".yellow(),
                original.display(),
                written.display()
            );
        }
    }

    Ok(())
}
