use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use reqwest::Method;
use std::path::PathBuf;
use std::sync::Arc;

use sw_cache::cache::{CacheStorage, SqliteStorage};
use sw_cache::config::Config;
use sw_cache::logging;
use sw_cache::net::{HttpClient, Network, Request, Response};
use sw_cache::worker::{ActiveWorker, CacheInterceptor, FetchOutcome};

#[derive(Parser, Debug)]
#[command(name = "sw-cache")]
#[command(about = "Request-interception cache: cache-first static assets, network-first everything else")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./sw-cache.yaml or $XDG_CONFIG_HOME/sw-cache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Cache database path (overrides SW_CACHE_DB and the config file)
  #[arg(long)]
  db: Option<PathBuf>,

  /// Write logs to this file instead of stderr
  #[arg(long)]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Pre-cache the static assets into the current bucket
  Install,
  /// Delete every bucket except the current one
  Activate,
  /// Send a request through the interceptor
  Fetch {
    /// Absolute URL, or a path relative to the configured origin
    url: String,
    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,
    /// Request body
    #[arg(short, long)]
    data: Option<String>,
    /// Print the response body
    #[arg(long)]
    body: bool,
  },
  /// List cache buckets
  Buckets,
  /// List cached URLs in a bucket (default: the current one)
  Keys { bucket: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init(args.log_file.as_deref())?;

  let config = Config::load(args.config.as_deref())?;
  let storage = Arc::new(open_storage(args.db, &config)?);

  match args.command {
    Command::Install => {
      let interceptor = interceptor(&config, storage)?;
      interceptor.handle_install().await?;
      println!(
        "Installed {} assets into {}",
        interceptor.config().static_assets.len(),
        interceptor.config().cache_name
      );
    }
    Command::Activate => {
      let interceptor = interceptor(&config, storage)?;
      let deleted = interceptor.handle_activate().await?;
      if deleted.is_empty() {
        println!("No stale buckets");
      }
      for name in deleted {
        println!("Deleted {}", name);
      }
    }
    Command::Fetch {
      url,
      method,
      data,
      body,
    } => {
      let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|e| eyre!("Invalid method '{}': {}", method, e))?;
      let mut request = Request::new(method, config.resolve_url(&url)?);
      if let Some(data) = data {
        request = request.with_body(data);
      }

      let worker = ActiveWorker::start(interceptor(&config, storage)?).await?;

      match worker.fetch(&request).await? {
        FetchOutcome::Passthrough => {
          // Default handling: straight to the network
          let response = worker.interceptor().network().fetch(&request).await?;
          print_response(&response, "passthrough", body);
        }
        FetchOutcome::Response(result) => {
          let source = match result.cached_at {
            Some(at) => format!("{}, cached {}", result.source, at.format("%Y-%m-%d %H:%M:%S")),
            None => result.source.to_string(),
          };
          print_response(&result.data, &source, body);
        }
        FetchOutcome::Miss => {
          return Err(eyre!(
            "Network unavailable and no cached response for {}",
            request.url
          ));
        }
      }
    }
    Command::Buckets => {
      let names = storage.bucket_names()?;
      if names.is_empty() {
        println!("No buckets");
      }
      for name in names {
        let marker = if name == config.cache_name { "*" } else { " " };
        println!("{} {}", marker, name);
      }
    }
    Command::Keys { bucket } => {
      let bucket = bucket.unwrap_or_else(|| config.cache_name.clone());
      let keys = storage.keys(&bucket)?;
      if keys.is_empty() {
        println!("No entries in {}", bucket);
      }
      for key in keys {
        println!("{}", key);
      }
    }
  }

  Ok(())
}

fn open_storage(explicit: Option<PathBuf>, config: &Config) -> Result<SqliteStorage> {
  match explicit.or_else(|| config.database_path()) {
    Some(path) => SqliteStorage::open(&path),
    None => SqliteStorage::open_default(),
  }
}

fn interceptor(
  config: &Config,
  storage: Arc<SqliteStorage>,
) -> Result<CacheInterceptor<SqliteStorage, HttpClient>> {
  Ok(CacheInterceptor::new(
    config.worker_config()?,
    storage,
    HttpClient::new()?,
  ))
}

fn print_response(response: &Response, source: &str, show_body: bool) {
  println!(
    "{} {} ({}) {} bytes",
    response.status,
    response.status_text,
    source,
    response.body.len()
  );
  if show_body {
    println!("{}", String::from_utf8_lossy(&response.body));
  }
}
