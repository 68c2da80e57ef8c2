//! rollupindex CLI: inspect an L1/L2 rollup index.
//!
//! # Commands
//! ```text
//! rollupindex status
//! rollupindex header         --chain <l1|l2> (--number <N> | --hash <H>)
//! rollupindex event          --chain <l1|l2> (--guid <G> | --tx <H> --log-index <I>)
//! rollupindex events         --chain <l1|l2> [--from <N>] --to <N> [--address <A>] [--signature <S>]
//! rollupindex epoch
//! rollupindex output         [--index <N>]
//! rollupindex export-headers --chain <l1|l2> --from <N> --to <N>
//! rollupindex watch          [--interval-secs <S>]
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use uuid::Uuid;

use rollupindex_core::{Chain, EventFilter, IndexStore};

mod cmd_watch;
mod config;
mod interrupt;
mod logging;
mod output;

use config::CliConfig;
use output::{batch_line, epoch_line, event_line, header_line, output_line, render_opt};

#[derive(Parser)]
#[command(
    name = "rollupindex",
    about = "Query an L1/L2 rollup index",
    long_about = "
rollupindex: read block headers, contract events, epochs and checkpoint
artifacts from an L1/L2 rollup index database.

ENVIRONMENT VARIABLES:
  ROLLUPINDEX_DB    SQLite database path (same as --db)
",
    version
)]
struct Cli {
    /// YAML config file with `storage:` and `log:` sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (selects the sqlite backend)
    #[arg(long, global = true, env = "ROLLUPINDEX_DB")]
    db: Option<PathBuf>,

    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Latest headers, epoch and checkpoints
    Status,

    /// Look up one block header
    Header {
        #[arg(long)]
        chain: Chain,
        /// Block number (decimal or 0x-hex)
        #[arg(long, value_parser = parse_u256, required_unless_present = "hash", conflicts_with = "hash")]
        number: Option<U256>,
        /// Block hash
        #[arg(long, value_parser = parse_b256)]
        hash: Option<B256>,
    },

    /// Look up one contract event
    Event {
        #[arg(long)]
        chain: Chain,
        /// Event GUID
        #[arg(long, required_unless_present = "tx", conflicts_with_all = ["tx", "log_index"])]
        guid: Option<Uuid>,
        /// Transaction hash
        #[arg(long, value_parser = parse_b256, requires = "log_index")]
        tx: Option<B256>,
        /// Log index within the transaction
        #[arg(long, requires = "tx")]
        log_index: Option<u64>,
    },

    /// List contract events in a block range
    Events {
        /// "l1" or "l2"
        #[arg(long)]
        chain: String,
        /// First block number (default: 0)
        #[arg(long, value_parser = parse_u256)]
        from: Option<U256>,
        /// Last block number (inclusive)
        #[arg(long, value_parser = parse_u256)]
        to: U256,
        /// Contract address
        #[arg(long, value_parser = parse_address)]
        address: Option<Address>,
        /// Event signature (topic 0)
        #[arg(long, value_parser = parse_b256)]
        signature: Option<B256>,
    },

    /// Latest L1/L2 epoch pair
    Epoch,

    /// Output proposal at an L2 output index, or the latest one
    Output {
        #[arg(long, value_parser = parse_u256)]
        index: Option<U256>,
    },

    /// Dump raw RLP headers in a block range
    #[command(name = "export-headers")]
    ExportHeaders {
        #[arg(long)]
        chain: Chain,
        #[arg(long, value_parser = parse_u256)]
        from: U256,
        #[arg(long, value_parser = parse_u256)]
        to: U256,
    },

    /// Print the latest epoch whenever it changes, until interrupted
    Watch {
        /// Polling interval in seconds
        #[arg(long, default_value_t = 12)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = CliConfig::load(cli.config.as_deref())?.with_db(cli.db.clone());
    if cli.verbose {
        cfg.log.level = "debug".into();
    }
    logging::init_tracing(&cfg.log);
    debug!(?cfg.storage, "configuration loaded");

    let store = cfg.storage.open().context("opening storage")?;
    let store = store.as_ref();
    let json = cli.json;

    match cli.command {
        Commands::Status => cmd_status(store, json),

        Commands::Header { chain, number, hash } => cmd_header(store, chain, number, hash, json),

        Commands::Event { chain, guid, tx, log_index } => {
            cmd_event(store, chain, guid, tx, log_index, json)
        }

        Commands::Events { chain, from, to, address, signature } => {
            cmd_events(store, &chain, from, to, address, signature, json)
        }

        Commands::Epoch => {
            println!("{}", render_opt(&store.latest_epoch()?, json, "epoch", epoch_line)?);
            Ok(())
        }

        Commands::Output { index } => {
            let proposal = match index {
                Some(i) => store.output_proposal_at(i)?,
                None => store.latest_checkpointed_output()?,
            };
            println!("{}", render_opt(&proposal, json, "output proposal", output_line)?);
            Ok(())
        }

        Commands::ExportHeaders { chain, from, to } => cmd_export_headers(store, chain, from, to),

        Commands::Watch { interval_secs } => {
            if interval_secs == 0 {
                bail!("--interval-secs must be at least 1");
            }
            let mut stdout = std::io::stdout().lock();
            cmd_watch::run(
                store,
                Duration::from_secs(interval_secs),
                json,
                interrupt::shutdown_signal(),
                &mut stdout,
            )
            .await?;
            Ok(())
        }
    }
}

// ─── Command implementations ─────────────────────────────────────────────────

fn cmd_status(store: &dyn IndexStore, json: bool) -> Result<()> {
    let l1 = store.latest_header(Chain::L1)?;
    let l2 = store.latest_header(Chain::L2)?;
    let epoch = store.latest_epoch()?;
    let output = store.latest_checkpointed_output()?;
    let batch = store.latest_legacy_state_batch()?;

    if json {
        let status = serde_json::json!({
            "backend": store.backend_name(),
            "l1_latest": l1,
            "l2_latest": l2,
            "epoch": epoch,
            "latest_output": output,
            "latest_legacy_state_batch": batch,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("backend:      {}", store.backend_name());
    println!("l1 latest:    {}", render_opt(&l1, false, "l1 header", header_line)?);
    println!("l2 latest:    {}", render_opt(&l2, false, "l2 header", header_line)?);
    println!("epoch:        {}", render_opt(&epoch, false, "epoch", epoch_line)?);
    println!("output:       {}", render_opt(&output, false, "output proposal", output_line)?);
    println!("legacy batch: {}", render_opt(&batch, false, "legacy state batch", batch_line)?);
    Ok(())
}

fn cmd_header(
    store: &dyn IndexStore,
    chain: Chain,
    number: Option<U256>,
    hash: Option<B256>,
    json: bool,
) -> Result<()> {
    let header = match (number, hash) {
        (Some(n), _) => store.header_at(chain, n)?,
        (None, Some(h)) => store.header_by_hash(chain, h)?,
        (None, None) => bail!("either --number or --hash is required"),
    };
    println!("{}", render_opt(&header, json, "header", header_line)?);
    Ok(())
}

fn cmd_event(
    store: &dyn IndexStore,
    chain: Chain,
    guid: Option<Uuid>,
    tx: Option<B256>,
    log_index: Option<u64>,
    json: bool,
) -> Result<()> {
    let event = match (guid, tx, log_index) {
        (Some(g), _, _) => store.event_by_id(chain, g)?,
        (None, Some(tx), Some(i)) => store.event_by_location(chain, tx, i)?,
        _ => bail!("either --guid or --tx with --log-index is required"),
    };
    println!("{}", render_opt(&event, json, "event", event_line)?);
    Ok(())
}

fn cmd_events(
    store: &dyn IndexStore,
    chain: &str,
    from: Option<U256>,
    to: U256,
    address: Option<Address>,
    signature: Option<B256>,
    json: bool,
) -> Result<()> {
    let filter = EventFilter {
        contract_address: address,
        event_signature: signature,
        ..Default::default()
    };
    let events = store.contract_events_with_filter(chain, &filter, from, to)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }
    for event in &events {
        println!("{}", event_line(event));
    }
    eprintln!("{} event(s)", events.len());
    Ok(())
}

fn cmd_export_headers(store: &dyn IndexStore, chain: Chain, from: U256, to: U256) -> Result<()> {
    if from > to {
        bail!("--from ({from}) is greater than --to ({to})");
    }
    for header in store.headers_in_range(chain, from, to)? {
        let rlp = alloy_rlp::encode(&header.raw_header);
        println!("{} 0x{}", header.number, hex::encode(rlp));
    }
    Ok(())
}

// ─── Argument parsers ────────────────────────────────────────────────────────

fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_str(s).map_err(|e| format!("invalid number '{s}': {e}"))
}

fn parse_b256(s: &str) -> Result<B256, String> {
    B256::from_str(s).map_err(|e| format!("invalid 32-byte hash '{s}': {e}"))
}

fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|e| format!("invalid address '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn number_parser_accepts_hex_and_decimal() {
        assert_eq!(parse_u256("255").unwrap(), U256::from(255));
        assert_eq!(parse_u256("0xff").unwrap(), U256::from(255));
        assert!(parse_u256("twelve").is_err());
    }

    #[test]
    fn header_requires_a_key() {
        let res = Cli::try_parse_from(["rollupindex", "header", "--chain", "l1"]);
        assert!(res.is_err());

        let cli = Cli::try_parse_from(["rollupindex", "header", "--chain", "l2", "--number", "7"])
            .unwrap();
        match cli.command {
            Commands::Header { chain, number, hash } => {
                assert_eq!(chain, Chain::L2);
                assert_eq!(number, Some(U256::from(7)));
                assert!(hash.is_none());
            }
            _ => panic!("expected header command"),
        }
    }

    #[test]
    fn event_location_needs_both_parts() {
        let tx = format!("{}", B256::with_last_byte(1));
        let res = Cli::try_parse_from(["rollupindex", "event", "--chain", "l1", "--tx", &tx]);
        assert!(res.is_err());
        let res = Cli::try_parse_from([
            "rollupindex", "event", "--chain", "l1", "--tx", &tx, "--log-index", "0",
        ]);
        assert!(res.is_ok());
    }

    #[test]
    fn invalid_chain_is_rejected_by_parser() {
        let res = Cli::try_parse_from(["rollupindex", "epoch", "--json"]);
        assert!(res.is_ok());
        let res = Cli::try_parse_from(["rollupindex", "header", "--chain", "l3", "--number", "1"]);
        assert!(res.is_err());
        let res = Cli::try_parse_from(["rollupindex", "header", "--chain", "L2", "--number", "1"]);
        assert!(res.is_err());
    }
}
