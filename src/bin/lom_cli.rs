use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lom_records::config::LomConfig;
use lom_records::serializers::{CitationStyle, OutputFormat};
use lom_records::services::{LomRecordsService, RecordsService, publish_fake_records};
use lom_records::types::{Identity, RecordId};
use lom_records::ui::{ViewArgs, record_export};

#[derive(Parser)]
#[command(name = "lom-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "LOM records CLI - manage indices, demo data and exports of LOM records")]
#[command(
    long_about = "LOM records CLI manages a local repository of Learning Object Metadata records: rebuild or refresh the search indices, publish seeded demo records and export a record as LOM-XML, DataCite JSON, UI JSON or a citation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Directory holding records, drafts and indices (overrides the config file and LOM_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Path of the TOML config file (default: <config dir>/lom-records/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum ExportFormatCli {
    LomXml,
    Datacite,
    UiJson,
    Citation,
}

impl From<ExportFormatCli> for OutputFormat {
    fn from(cli_format: ExportFormatCli) -> Self {
        match cli_format {
            ExportFormatCli::LomXml => OutputFormat::LomXml,
            ExportFormatCli::Datacite => OutputFormat::Datacite,
            ExportFormatCli::UiJson => OutputFormat::UiJson,
            ExportFormatCli::Citation => OutputFormat::Citation,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CitationStyleCli {
    Apa,
    Harvard,
    Chicago,
}

impl From<CitationStyleCli> for CitationStyle {
    fn from(cli_style: CitationStyleCli) -> Self {
        match cli_style {
            CitationStyleCli::Apa => CitationStyle::Apa,
            CitationStyleCli::Harvard => CitationStyle::Harvard,
            CitationStyleCli::Chicago => CitationStyle::Chicago,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Clear both indices and index every stored record and draft
    RebuildIndex,
    /// Create and publish fake LOM records for demonstration
    ///
    /// Record ids are drawn from the seeded generator. Records whose id already exists are skipped, so rerunning with the same seed adds nothing; use another seed to add more.
    Demo {
        /// Number of records to create (default: 100)
        #[arg(short, long, default_value = "100")]
        number: usize,
        /// Seed of the random generator; the same seed yields the same ids and records, existing ids are skipped (default: 42)
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Index every published record found in storage
    Reindex,
    /// Print a record serialized in one of the export formats
    Export {
        /// Persistent identifier of the record (e.g. "a1b2c-3d4e5")
        pid: String,
        /// Export format (default: lom-xml)
        #[arg(short, long, default_value = "lom-xml")]
        format: ExportFormatCli,
        /// Citation style, only used with --format citation (default: from config)
        #[arg(long)]
        style: Option<CitationStyleCli>,
        /// Export the draft when there is one
        #[arg(long)]
        preview: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lom_records=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = LomConfig::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let service = LomRecordsService::open(config.data_dir.clone())
        .map_err(|e| anyhow::anyhow!("Failed to open records at {}: {}", config.data_dir.display(), e))?;
    let identity = Identity::system();

    match cli.command {
        Commands::RebuildIndex => {
            println!("Reindexing records and drafts...");
            let indexed = service
                .rebuild_index(&identity)
                .map_err(|e| anyhow::anyhow!("Failed to rebuild index: {}", e))?;
            println!("Reindexed records! ({} documents)", indexed);
        }
        Commands::Demo { number, seed } => {
            println!("Creating {} LOM demo records", number);
            let published = publish_fake_records(&service, number, seed)
                .map_err(|e| anyhow::anyhow!("Failed to publish demo records: {}", e))?;
            println!(
                "Published fake LOM records to the database! ({} new, {} already present)",
                published.len(),
                number - published.len()
            );
        }
        Commands::Reindex => {
            println!("Reindexing LOM records...");
            let indexed = service
                .reindex_records(&identity)
                .map_err(|e| anyhow::anyhow!("Failed to reindex records: {}", e))?;
            println!("Successfully reindexed LOM records! ({} records)", indexed);
        }
        Commands::Export {
            pid,
            format,
            style,
            preview,
        } => {
            let args = ViewArgs {
                pid_value: RecordId::from(pid.as_str()),
                is_preview: preview,
            };
            let output = record_export(
                &service,
                &identity,
                &args,
                format.into(),
                style.map(Into::into),
                &config,
            )
            .map_err(|e| anyhow::anyhow!("Failed to export record '{}': {}", pid, e))?;
            println!("{}", output);
        }
    }

    Ok(())
}
