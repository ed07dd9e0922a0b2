use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use chunkvault_cache::{CacheBackend, ChunkCache};
use chunkvault_config::{CacheConfig, VaultConfig};
use chunkvault_engine::{TracingSink, Vault, VaultError, cache_backend};
use chunkvault_metadata::SqliteStore;

type CliVault = Vault<Arc<dyn CacheBackend>, SqliteStore, TracingSink>;

/// Chunkvault - a deduplicating chunked file store over a volatile cache
#[derive(Parser)]
#[command(name = "chunkvault")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.chunkvault)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// JSON config file. CHUNKVAULT_* environment variables still apply.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Store one or more files and print their ids
  Put {
    /// Files to store
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Name to record instead of the file name (single file only)
    #[arg(long)]
    name: Option<String>,
  },

  /// Reassemble a stored file
  Get {
    /// File id
    id: String,

    /// Write to this path instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
  },

  /// Print a stored file's metadata as JSON
  Stat {
    /// File id
    id: String,
  },

  /// Check that the cache and metadata store are reachable
  Health,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .with_writer(std::io::stderr)
    .init();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".chunkvault"),
  };

  let Some(command) = cli.command else {
    println!("chunkvault - use --help to see available commands");
    return Ok(());
  };

  let config = load_config(cli.config.as_deref(), &data_dir)?;

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    let vault = open_vault(config, &data_dir).await?;
    match command {
      Commands::Put { paths, name } => put(&vault, paths, name).await,
      Commands::Get { id, output } => get(&vault, &id, output).await,
      Commands::Stat { id } => stat(&vault, &id).await,
      Commands::Health => health(&vault).await,
    }
  })
}

/// Config from `--config` if given, otherwise defaults rooted in the data
/// directory. Environment overrides apply either way.
fn load_config(path: Option<&Path>, data_dir: &Path) -> Result<VaultConfig> {
  if let Some(path) = path {
    return VaultConfig::load(path)
      .with_context(|| format!("failed to load config: {}", path.display()));
  }

  let mut config = VaultConfig {
    database_url: format!("sqlite://{}", data_dir.join("metadata.db").display()),
    cache: CacheConfig::Directory {
      path: data_dir.join("cache"),
    },
    ..VaultConfig::default()
  };
  config
    .apply_overrides(|key| std::env::var(key).ok())
    .context("invalid environment override")?;
  config.validate().context("invalid configuration")?;
  Ok(config)
}

async fn open_vault(config: VaultConfig, data_dir: &Path) -> Result<CliVault> {
  tokio::fs::create_dir_all(data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

  debug!(database_url = %config.database_url, cache = ?config.cache, "opening vault");

  let metadata = SqliteStore::connect(&config.database_url)
    .await
    .context("failed to open metadata store")?;
  let cache = ChunkCache::new(cache_backend(&config.cache));

  Vault::with_sink(config, cache, metadata, TracingSink).context("failed to create vault")
}

async fn put(vault: &CliVault, paths: Vec<PathBuf>, name: Option<String>) -> Result<()> {
  if name.is_some() && paths.len() > 1 {
    bail!("--name can only be used with a single file");
  }

  let mut ids = Vec::with_capacity(paths.len());
  for path in &paths {
    let name = match &name {
      Some(name) => name.clone(),
      None => path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default(),
    };
    if name.trim().is_empty() {
      bail!("file name is empty: {}", path.display());
    }

    let mut file = tokio::fs::File::open(path)
      .await
      .with_context(|| format!("failed to open {}", path.display()))?;
    let stored = vault
      .ingest_stream(&name, &mut file)
      .await
      .with_context(|| format!("failed to store {}", path.display()))?;

    eprintln!("Stored {} ({} parts)", path.display(), stored.parts.len());
    ids.push(stored.id);
  }

  println!("{}", ids.join(","));
  Ok(())
}

async fn get(vault: &CliVault, id: &str, output: Option<PathBuf>) -> Result<()> {
  let content = match vault.retrieve_by_id(id).await {
    Ok(content) => content,
    Err(VaultError::DataUnavailable { .. } | VaultError::DataCorrupt { .. }) => {
      bail!("data has been evicted or is corrupted")
    }
    Err(e) => return Err(e).with_context(|| format!("failed to retrieve {}", id)),
  };

  match output {
    Some(path) => {
      tokio::fs::write(&path, &content)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
      eprintln!("Wrote {} bytes to {}", content.len(), path.display());
    }
    None => {
      let mut stdout = tokio::io::stdout();
      stdout.write_all(&content).await?;
      stdout.flush().await?;
    }
  }

  Ok(())
}

async fn stat(vault: &CliVault, id: &str) -> Result<()> {
  let file = vault.file(id).await?;
  println!("{}", serde_json::to_string_pretty(&file)?);
  Ok(())
}

async fn health(vault: &CliVault) -> Result<()> {
  vault.health().await.context("health check failed")?;
  println!("ok");
  Ok(())
}
