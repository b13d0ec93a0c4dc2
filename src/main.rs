//! OSD Device Provisioner
//!
//! One-shot provisioning agent for the storage devices of a single node:
//! computes the partition scheme for the requested data devices (collocated,
//! or distributed against a shared metadata device), formats them, and
//! records the resulting device-to-OSD ownership in the desired-state store.
//!
//! Standalone runs use the in-memory store and log the resulting records;
//! clustered deployments embed the library and inject the distributed store.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use osd_provisioner::state::DESIRED_STATE_ROOT;
use osd_provisioner::{
    partition_bluestore_metadata, partition_bluestore_osd, AgentContext, BluestoreConfig,
    MemoryStore, MetadataDeviceInfo, OsdConfig, PartitionScheme, PartitionSchemeEntry, Result,
    ShellExecutor,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// OSD Device Provisioner - partition node storage devices for OSDs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Identity of this node in the cluster
    #[arg(long, env = "NODE_ID")]
    node_id: String,

    /// Node-local configuration root
    #[arg(long, env = "CONFIG_DIR", default_value = "/var/lib/rook")]
    config_dir: PathBuf,

    /// Data devices to provision, one OSD each (short names, e.g. sdb,sdc)
    #[arg(long, value_delimiter = ',', required = true)]
    data_devices: Vec<String>,

    /// Shared metadata device for the distributed layout; when omitted,
    /// WAL/DB are collocated with each OSD's data
    #[arg(long)]
    metadata_device: Option<String>,

    /// WAL partition size in MB (0 = backend default)
    #[arg(long, default_value_t = 0)]
    wal_size_mb: u64,

    /// DB partition size in MB (0 = backend default)
    #[arg(long, default_value_t = 0)]
    db_size_mb: u64,

    /// First OSD ID to assign; devices get consecutive IDs
    #[arg(long, default_value_t = 0)]
    first_osd_id: u32,

    /// Overwrite devices holding data this system does not own
    #[arg(long, env = "FORCE_FORMAT")]
    force_format: bool,

    /// Compute and print the partition scheme without touching any disk
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(&args).await {
        error!("provisioning failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    info!("Starting OSD Device Provisioner");
    info!("  Version: {}", osd_provisioner::VERSION);
    info!("  Node: {}", args.node_id);
    info!("  Data devices: {:?}", args.data_devices);
    info!("  Metadata device: {:?}", args.metadata_device);

    let scheme = build_scheme(args);

    for entry in &scheme.entries {
        for part in &entry.partitions {
            info!(
                "  osd {}: {} partition {} on {} ({} MB)",
                entry.osd_id, part.role, part.num, part.device, part.size_mb
            );
        }
    }
    if args.dry_run {
        info!("dry run, no devices were modified");
        return Ok(());
    }

    let store = Arc::new(MemoryStore::new());
    let context = AgentContext::new(
        Arc::new(ShellExecutor::new()),
        store.clone(),
        args.node_id.clone(),
        args.config_dir.clone(),
    );

    // metadata device first: a distributed OSD is unusable until its WAL/DB
    // partitions exist
    if let Some(metadata) = &scheme.metadata {
        partition_bluestore_metadata(&context, metadata, &args.config_dir).await?;
    }

    for entry in &scheme.entries {
        let config = OsdConfig::new(entry.osd_id, entry.osd_uuid, &args.config_dir, entry.clone())
            .with_force_format(args.force_format);
        partition_bluestore_osd(&context, &config).await?;
    }

    scheme.save(&args.config_dir)?;

    for (key, value) in store.entries_under(DESIRED_STATE_ROOT) {
        info!("desired state: {} = {}", key, value);
    }

    info!("provisioned {} device(s)", args.data_devices.len());
    Ok(())
}

/// Compute the partition scheme for the requested devices.
fn build_scheme(args: &Args) -> PartitionScheme {
    let bluestore = BluestoreConfig {
        wal_size_mb: args.wal_size_mb,
        database_size_mb: args.db_size_mb,
    };

    let mut scheme = PartitionScheme::new();
    let mut metadata = args
        .metadata_device
        .as_deref()
        .map(MetadataDeviceInfo::new);

    for (i, device) in args.data_devices.iter().enumerate() {
        let mut entry = PartitionSchemeEntry::new();
        entry.osd_id = args.first_osd_id + i as u32;
        entry.osd_uuid = Uuid::new_v4();
        match metadata.as_mut() {
            Some(metadata) => entry.populate_distributed(device, metadata, &bluestore),
            None => entry.populate_collocated(device, &bluestore),
        }
        scheme.entries.push(entry);
    }

    scheme.metadata = metadata;
    scheme
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
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
