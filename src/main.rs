//! raidsim
//!
//! Command-line driver for the erasure-coded disk array simulator.
//!
//! ```text
//! payload ─▶ split ─▶ encode ─▶ drop / flip ─▶ detect ─▶ reconstruct ─▶ join
//! ```
//!
//! ```bash
//! raidsim --data-shards 5 --parity-shards 5 \
//!     --payload "Lorem ipsum dolor sit amet, consectetur adipiscing elit." \
//!     --drop 2,3,4,7,8
//! ```

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use raidsim::config::{RaidConfig, DEFAULT_SHARD_CAPACITY};
use raidsim::ec::{ArrayState, RaidSystem, RecoveryAction};
use raidsim::payload;
use raidsim::render::{bit_string, matrix_table, DiskArrayTable};

// =============================================================================
// CLI Arguments
// =============================================================================

/// raidsim - encode a payload into a simulated RAID array, break it, repair it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML file with dataShards / parityShards / shardCapacity
    #[arg(long, env = "RAIDSIM_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Number of data shards (ignored when --config is given)
    #[arg(long, env = "RAIDSIM_DATA_SHARDS", default_value = "3")]
    data_shards: usize,

    /// Number of parity shards (ignored when --config is given)
    #[arg(long, env = "RAIDSIM_PARITY_SHARDS", default_value = "3")]
    parity_shards: usize,

    /// Maximum bytes per shard (ignored when --config is given)
    #[arg(long, env = "RAIDSIM_SHARD_CAPACITY", default_value_t = DEFAULT_SHARD_CAPACITY)]
    shard_capacity: usize,

    /// Payload to encode
    #[arg(long, env = "RAIDSIM_PAYLOAD", default_value = "abcdefghijklmnopqrstuvwxyz")]
    payload: String,

    /// Disk indices to drop, comma separated
    #[arg(long, value_delimiter = ',')]
    drop: Vec<usize>,

    /// Bit flips as DISK:BIT, comma separated
    #[arg(long, value_delimiter = ',', value_parser = parse_flip)]
    flip: Vec<(usize, usize)>,

    /// Only detect and report, do not reconstruct
    #[arg(long)]
    no_repair: bool,

    /// Print the encoding matrix
    #[arg(long)]
    show_matrix: bool,

    /// Print the payload as a bit string
    #[arg(long)]
    show_bits: bool,

    /// Print a JSON report instead of tables
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

fn parse_flip(s: &str) -> Result<(usize, usize), String> {
    let (disk, bit) = s
        .split_once(':')
        .ok_or_else(|| format!("expected DISK:BIT, got '{}'", s))?;
    let disk = disk
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid disk index '{}': {}", disk, e))?;
    let bit = bit
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid bit position '{}': {}", bit, e))?;
    Ok((disk, bit))
}

// =============================================================================
// Report
// =============================================================================

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Report {
    config: RaidConfig,
    payload_len: usize,
    state_after_faults: ArrayState,
    present: Vec<bool>,
    parity_valid: Option<Vec<bool>>,
    recovery: Option<RecoveryAction>,
    error: Option<String>,
    final_state: ArrayState,
    output: Option<String>,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = match &args.config {
        Some(path) => RaidConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RaidConfig::new(args.data_shards, args.parity_shards)
            .with_shard_capacity(args.shard_capacity),
    };

    info!(
        "Starting raidsim with {}+{} shards",
        config.data_shards, config.parity_shards
    );

    let mut raid = RaidSystem::with_config(config.clone())?;

    let data = args.payload.as_bytes();
    let shards = payload::split(data, raid.data_shards())?;
    raid.encode(&shards).context("encoding payload")?;

    if !args.json {
        if args.show_bits {
            println!("Payload bits: {}", bit_string(data));
        }
        if args.show_matrix {
            print!("{}", matrix_table("Encoding matrix", raid.encoding_matrix()));
        }
        println!("Encoded disk array:");
        print!("{}", DiskArrayTable::new(raid.disk_array(), raid.data_shards()));
    }

    for &index in &args.drop {
        raid.drop_shard(index)?;
    }
    for &(index, bit) in &args.flip {
        raid.create_bit_flip(index, bit)?;
    }

    let state_after_faults = raid.state();
    let present = raid.detect_broken_disk();
    let parity_valid = raid.verify().ok().map(|v| v.parity_valid);

    if !args.json {
        println!("State after faults: {}", state_after_faults);
        println!("Present disks: {:?}", present);
        if let Some(valid) = &parity_valid {
            println!("Parity valid: {:?}", valid);
        }
    }

    let mut recovery = None;
    let mut failure = None;
    if !args.no_repair {
        match repair(&mut raid, !args.flip.is_empty()) {
            Ok(action) => recovery = Some(action),
            Err(e) => {
                error!("Reconstruction failed: {}", e);
                failure = Some(e);
            }
        }
    }

    let output = raid
        .data_buffers()
        .ok()
        .map(|buffers| String::from_utf8_lossy(&payload::join(&buffers, data.len())).into_owned());

    let report = Report {
        config,
        payload_len: data.len(),
        state_after_faults,
        present,
        parity_valid,
        recovery,
        error: failure.as_ref().map(|e| e.to_string()),
        final_state: raid.state(),
        output,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if !args.no_repair {
            println!("Recovered disk array:");
            print!("{}", DiskArrayTable::new(raid.disk_array(), raid.data_shards()));
        }
        println!("Final state: {}", report.final_state);
        match &report.output {
            Some(text) => println!("Output: {}", text),
            None => println!("Output: <data shards missing>"),
        }
    }

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Rebuild lost disks, then repair parity if corruption was injected
fn repair(raid: &mut RaidSystem, check_corruption: bool) -> raidsim::Result<RecoveryAction> {
    let action = raid.reconstruct_disk()?;
    if check_corruption {
        raid.reconstruct_corruption()?;
    }
    Ok(action)
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flip() {
        assert_eq!(parse_flip("6:1"), Ok((6, 1)));
        assert_eq!(parse_flip(" 2 : 17 "), Ok((2, 17)));
        assert!(parse_flip("6").is_err());
        assert!(parse_flip("a:1").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "raidsim",
            "--data-shards",
            "5",
            "--parity-shards",
            "5",
            "--drop",
            "2,3,4,7,8",
            "--flip",
            "6:1",
        ]);
        assert_eq!(args.data_shards, 5);
        assert_eq!(args.drop, vec![2, 3, 4, 7, 8]);
        assert_eq!(args.flip, vec![(6, 1)]);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
