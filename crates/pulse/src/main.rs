use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pulse::{read_file, PulseError, ReadOptions, Settings};
use pulse_common::FileObjectMeta;
use pulse_connector_filesystem::{FileOffsetStore, IteratorManager};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the records of a Parquet file as JSON lines, resuming after the
    /// last committed offset.
    Read {
        file: PathBuf,
        #[arg(long)]
        reset: bool,
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Show the committed offset of a file.
    Offset { file: PathBuf },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // stdout carries records
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<(), PulseError> {
    let args = Args::parse();
    let settings = Settings::new(args.config.as_deref())?;
    init_tracing(&settings.log_level);

    let store = FileOffsetStore::new(&settings.offsets_dir)?;

    match args.command {
        Command::Read { file, reset, limit } => {
            let metadata = FileObjectMeta::from_local_path(&file)?;
            let manager = IteratorManager::new();
            let options = ReadOptions {
                reset,
                limit,
                commit_interval: settings.commit_interval,
            };

            let interrupt_manager = manager.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, closing open iterators");
                    interrupt_manager.close_everything();
                }
            });

            let summary = tokio::task::spawn_blocking(move || {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                read_file(&metadata, &store, &manager, &options, &mut out)
            })
            .await??;
            info!(
                emitted = summary.emitted,
                offset = %summary.offset,
                interrupted = summary.interrupted,
                "Finished reading"
            );
        }
        Command::Offset { file } => {
            let metadata = FileObjectMeta::from_local_path(&file)?;
            match store.load(&metadata)? {
                Some(offset) => println!(
                    "{} position={} rows={} timestamp={}",
                    metadata.uri,
                    offset.position(),
                    offset.rows(),
                    offset.timestamp()
                ),
                None => println!("{} has no committed offset", metadata.uri),
            }
        }
    }

    Ok(())
}
