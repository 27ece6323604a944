mod config;
mod net;
mod store;
mod unsplash;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use futures::StreamExt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::Config;
use net::{CachedResult, Envelope, ErrorIcon, NetworkError, NetworkResult, RequestHandler};
use store::SqliteStore;
use unsplash::{BasicError, Photo, PhotoRepository, UnsplashClient};

#[derive(Parser, Debug)]
#[command(name = "shutter")]
#[command(about = "A terminal photo browser for Unsplash-style APIs")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/shutter/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Skip the local cache for this run
  #[arg(long)]
  no_cache: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Fetch one random photo
  Random,
  /// Fetch many random photos concurrently
  Parallel {
    /// How many requests to fan out
    #[arg(short = 'n', long, default_value_t = 20)]
    count: usize,
  },
  /// Browse one page of the photo feed, served from the cache while it refreshes
  Photos {
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 10)]
    per_page: u32,

    /// Refresh from the remote even when the cached page is fresh
    #[arg(long)]
    refresh: bool,
  },
  /// Show a single photo by id
  Show {
    id: String,

    #[arg(long)]
    refresh: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let repository = build_repository(&config, args.no_cache)?;

  let ok = match args.command {
    Command::Random => random(&repository).await,
    Command::Parallel { count } => parallel(&repository, count).await,
    Command::Photos {
      page,
      per_page,
      refresh,
    } => photos(&repository, page, per_page, refresh).await,
    Command::Show { id, refresh } => show(&repository, &id, refresh).await,
  };

  if !ok {
    std::process::exit(1);
  }

  Ok(())
}

/// Composition root: build the remote caller, local store and request
/// handler, and hand them to the repository explicitly.
fn build_repository(config: &Config, no_cache: bool) -> Result<PhotoRepository> {
  let client = UnsplashClient::new(config)?;
  let handler = RequestHandler::new(Envelope::Plain);

  let store = if no_cache || !config.cache.enabled {
    None
  } else {
    Some(SqliteStore::open()?)
  };

  Ok(PhotoRepository::new(
    handler,
    client,
    store,
    chrono::Duration::minutes(config.cache.stale_minutes),
  ))
}

async fn random(repository: &PhotoRepository) -> bool {
  match repository.random_photo().await {
    NetworkResult::Success(photo) => {
      print_photo(&photo);
      true
    }
    NetworkResult::Error(error) => {
      print_error(&error);
      false
    }
  }
}

async fn parallel(repository: &PhotoRepository, count: usize) -> bool {
  let results = repository.random_photos(count).await;

  // Print every success, report the first observed error.
  let mut first_error = None;
  for result in results {
    match result {
      NetworkResult::Success(photo) => print_photo_line(&photo),
      NetworkResult::Error(error) => {
        if first_error.is_none() {
          first_error = Some(error);
        }
      }
    }
  }

  match first_error {
    Some(error) => {
      print_error(&error);
      false
    }
    None => true,
  }
}

async fn photos(repository: &PhotoRepository, page: u32, per_page: u32, refresh: bool) -> bool {
  let mut states = repository.photos(page, per_page, refresh);
  let mut ok = true;

  while let Some(state) = states.next().await {
    match state {
      CachedResult::Loading(None) => eprintln!("loading..."),
      CachedResult::Loading(Some(cached)) => {
        eprintln!("{} cached photos, refreshing...", cached.len());
      }
      CachedResult::Success(photos) => {
        for photo in &photos {
          print_photo_line(photo);
        }
        ok = true;
      }
      CachedResult::Error(cached, error) => {
        print_error(&error);
        if let Some(photos) = cached {
          eprintln!("showing {} cached photos instead", photos.len());
          for photo in &photos {
            print_photo_line(photo);
          }
        }
        ok = false;
      }
    }
  }

  ok
}

async fn show(repository: &PhotoRepository, id: &str, refresh: bool) -> bool {
  let mut states = repository.photo(id, refresh);
  let mut ok = true;

  while let Some(state) = states.next().await {
    match state {
      CachedResult::Loading(_) => {}
      CachedResult::Success(photo) => {
        print_photo(&photo);
        ok = true;
      }
      CachedResult::Error(cached, error) => {
        print_error(&error);
        if let Some(photo) = cached {
          eprintln!("showing the cached copy instead");
          print_photo(&photo);
        }
        ok = false;
      }
    }
  }

  ok
}

fn print_photo(photo: &Photo) {
  println!(
    "{} by {} (@{})",
    photo.id, photo.user.name, photo.user.username
  );
  if let Some(caption) = photo.caption() {
    println!("  {}", caption);
  }
  println!("  {}x{}  {}", photo.width, photo.height, photo.color);
  println!("  {}", photo.urls.regular);
}

fn print_photo_line(photo: &Photo) {
  let caption = photo.caption().unwrap_or("untitled");
  println!("{}  {}  by {}", photo.id, caption, photo.user.name);
}

fn print_error(error: &NetworkError<BasicError>) {
  eprintln!("{} {}", icon_glyph(error.icon()), error.display_message());
}

fn icon_glyph(icon: ErrorIcon) -> &'static str {
  match icon {
    ErrorIcon::CloudOff => "[offline]",
    ErrorIcon::LinkOff => "[missing]",
    ErrorIcon::ErrorOutline => "[error]",
    ErrorIcon::NoEncryption => "[insecure]",
  }
}
