use clap::{Parser, Subcommand};
use gamesdb_cover_engine::{
    gamesdb_platform, title_id, BatchImporter, BatchProgress, DiskArtworkStore, GameRecord,
    GamesDbProvider, ImportEngine, ImportMode, ImportOutcome, ReleaseArtProvider,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cover-engine-cli")]
#[command(about = "GamesDB cover/background import CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Artwork data directory
    #[arg(short, long, default_value = "./artwork")]
    data_dir: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Download cover and background art for one or more games
    Fetch {
        /// Source tag the games belong to (steam, heroic_gog, heroic_epic, itch)
        #[arg(short, long)]
        source: String,

        /// Game ids, e.g. steam_730
        #[arg(required = true)]
        game_ids: Vec<String>,

        /// Maximum concurrent imports
        #[arg(long, default_value = "8")]
        max_concurrent: usize,
    },

    /// Print the resolved metadata and image URLs for one game
    Lookup {
        /// Source tag the game belongs to
        #[arg(short, long)]
        source: String,

        /// Game id, e.g. steam_730
        game_id: String,
    },

    /// Check whether GamesDB is reachable
    Probe,
}

/// Command-line game entry; the loading/persistence hooks are no-ops here
struct CliGame {
    source: String,
    game_id: String,
}

impl GameRecord for CliGame {
    fn source(&self) -> &str {
        &self.source
    }

    fn game_id(&self) -> &str {
        &self.game_id
    }

    fn set_loading(&self, _delta: i32) {}

    fn save(&self) {}

    fn update(&self) {}
}

/// Prints each outcome as it lands, then counts down to idle
struct PrintProgress {
    progress: BatchProgress,
}

impl BatchImporter for PrintProgress {
    fn task_done(&self, outcome: &ImportOutcome) {
        if outcome.is_success() {
            println!("✅ {}", outcome.display());
        } else {
            println!("❌ {}", outcome.display());
        }
        self.progress.task_done(outcome);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let provider = Arc::new(GamesDbProvider::new());

    match cli.command {
        Commands::Fetch {
            source,
            game_ids,
            max_concurrent,
        } => {
            let store = Arc::new(DiskArtworkStore::new(&cli.data_dir)?);
            let reporter = Arc::new(PrintProgress {
                progress: BatchProgress::new(game_ids.len()),
            });

            let engine = ImportEngine::with_concurrency(
                provider,
                store,
                ImportMode::Batch(reporter.clone()),
                max_concurrent,
            );

            println!("🔍 Fetching artwork for {} game(s)...", game_ids.len());

            let games: Vec<Arc<dyn GameRecord>> = game_ids
                .iter()
                .map(|game_id| {
                    Arc::new(CliGame {
                        source: source.clone(),
                        game_id: game_id.clone(),
                    }) as Arc<dyn GameRecord>
                })
                .collect();

            engine.submit(games);
            reporter.progress.wait_idle().await;

            if let Some(error) = reporter.progress.last_error() {
                println!("\n⚠️ Last error: {}", error);
            }
            println!("📦 Artwork directory: {}", cli.data_dir);
        }

        Commands::Lookup { source, game_id } => {
            let platform = gamesdb_platform(&source)
                .ok_or_else(|| anyhow::anyhow!("Unsupported platform: {}", source))?;
            let title = title_id(&game_id);

            println!("🔍 {} -> platform {}, release {}", game_id, platform, title);

            match provider.release_art(platform, title).await? {
                Some(art) => {
                    match &art.vertical_cover {
                        Some(cover) => println!("   Cover:      {}", cover.resolve()),
                        None => println!("   Cover:      none"),
                    }
                    match &art.background {
                        Some(background) => println!("   Background: {}", background.resolve()),
                        None => println!("   Background: none"),
                    }
                }
                None => println!("   No GamesDB entry"),
            }
        }

        Commands::Probe => {
            if provider.is_available().await {
                println!("✅ GamesDB is reachable");
            } else {
                println!("❌ GamesDB is unreachable");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
