use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use podheaven::engine::EventSink;
use podheaven::error::EngineError;
use podheaven::format::{format_duration, format_published, format_view_count};
use podheaven::player::PLAYBACK_RATES;
use podheaven::{
    CatalogProvider, Command, Config, Episode, EpisodeFilter, FileStorage, LikedEpisodes,
    PlaybackStore, PlayerSession, ProgressEvent, ProgressReporter, ReqwestClient,
    SharedProgressReporter, Snapshot, TracingReporter, Transport,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static PLAYING: Emoji<'_, '_> = Emoji("▶️  ", "> ");
static PAUSED: Emoji<'_, '_> = Emoji("⏸️  ", "| ");
static HEART: Emoji<'_, '_> = Emoji("❤️ ", "<3 ");
static SLEEP: Emoji<'_, '_> = Emoji("💤 ", "zz ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Browse creator podcast feeds and play episodes
#[derive(Parser, Debug)]
#[command(name = "podheaven")]
#[command(about = "Browse creator podcast feeds and play episodes")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// JSON file mapping creator names to feed URLs
    #[arg(long, global = true)]
    sources: Option<PathBuf>,

    /// Directory holding preferences (defaults to the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List episodes, most viewed first (newest first for a single creator)
    List {
        /// Only titles containing this text
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only episodes from this creator
        #[arg(short, long)]
        creator: Option<String>,

        /// Maximum number of episodes to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// List creators and their episode counts
    Creators,

    /// List liked episodes
    Liked,

    /// Show details and description of an episode
    Show {
        /// Episode identifier
        id: String,
    },

    /// Like or unlike an episode
    Like {
        /// Episode identifier
        id: String,
    },

    /// Play episodes in order
    Play {
        /// Episode identifiers; the first plays now, the rest are queued
        #[arg(required = true)]
        ids: Vec<String>,

        /// Playback speed
        #[arg(long, default_value = "1", value_parser = parse_rate)]
        speed: f64,

        /// Volume between 0 and 1
        #[arg(long, default_value = "1", value_parser = parse_volume)]
        volume: f64,

        /// Pause after this many minutes
        #[arg(long)]
        sleep: Option<u64>,
    },
}

fn parse_rate(value: &str) -> Result<f64, String> {
    let rate: f64 = value.parse().map_err(|_| format!("'{value}' is not a number"))?;
    if PLAYBACK_RATES.contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("speed must be one of {:?}", PLAYBACK_RATES))
    }
}

fn parse_volume(value: &str) -> Result<f64, String> {
    let volume: f64 = value.parse().map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&volume) {
        Ok(volume)
    } else {
        Err("volume must be between 0 and 1".to_string())
    }
}

/// Spinner shown while feeds load
struct SpinnerReporter {
    bar: ProgressBar,
}

impl SpinnerReporter {
    fn new() -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { bar }
    }
}

impl ProgressReporter for SpinnerReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingSource { creator, .. } => {
                self.bar
                    .set_message(format!("{SEARCH}Fetching {}", creator.cyan()));
            }
            ProgressEvent::SourceLoaded { creator, episodes } => {
                self.bar.set_message(format!(
                    "{SUCCESS}{} ({} episodes)",
                    creator.green(),
                    episodes
                ));
            }
            ProgressEvent::SourceFailed { creator, error } => {
                self.bar.abandon_with_message(format!(
                    "{CROSS}{} - {}",
                    creator.red(),
                    error.red()
                ));
            }
            ProgressEvent::CatalogReady { .. } | ProgressEvent::CatalogCached { .. } => {
                self.bar.finish_and_clear();
            }
        }
    }
}

#[cfg(feature = "mpv")]
fn open_audio(events: EventSink) -> Result<podheaven::engine::MpvEngine, EngineError> {
    podheaven::engine::MpvEngine::spawn(events)
}

#[cfg(not(feature = "mpv"))]
fn open_audio(events: EventSink) -> Result<podheaven::engine::NoOutput, EngineError> {
    podheaven::engine::no_output(events)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "podheaven=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        title.to_string()
    } else {
        let head: String = title.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn print_episodes(episodes: &[Arc<Episode>], liked: &LikedEpisodes<FileStorage>) {
    use podheaven::PreferenceStore;

    let liked = liked.load();
    for (index, episode) in episodes.iter().enumerate() {
        let heart = if liked.contains(&episode.id) {
            HEART.to_string()
        } else {
            String::new()
        };
        let published = format_published(episode.published)
            .unwrap_or_else(|| episode.published_text.clone());

        println!(
            "{:>3}. {}{} {}",
            (index + 1).to_string().dimmed(),
            heart,
            truncate_title(&episode.title, 60).bold(),
            episode.author.magenta()
        );
        println!(
            "     {} • {} views • {} • {}",
            format_duration(episode.duration_seconds as f64).cyan(),
            format_view_count(episode.view_count),
            published,
            episode.id.dimmed()
        );
    }

    if episodes.is_empty() {
        println!("{}", "No episodes found".yellow());
    }
}

fn now_playing_line(snapshot: &Snapshot) -> String {
    let Some(episode) = &snapshot.current_episode else {
        return String::new();
    };

    let icon = if snapshot.is_playing { PLAYING } else { PAUSED };
    let duration = if snapshot.duration_seconds > 0.0 {
        snapshot.duration_seconds
    } else {
        episode.duration_seconds as f64
    };

    let mut line = format!(
        "{icon}{} {} / {}",
        truncate_title(&episode.title, 40).bold(),
        format_duration(snapshot.progress_seconds),
        format_duration(duration)
    );
    if !snapshot.queue.is_empty() {
        line.push_str(&format!(" • {} queued", snapshot.queue.len()));
    }
    if let Some(minutes) = snapshot.sleep_timer_minutes {
        line.push_str(&format!(" • {SLEEP}{}m", minutes));
    }
    line
}

async fn play(
    episodes: Vec<Arc<Episode>>,
    preferences: LikedEpisodes<FileStorage>,
    speed: f64,
    volume: f64,
    sleep: Option<u64>,
    quiet: bool,
) -> Result<()> {
    if cfg!(not(feature = "mpv")) {
        bail!("this build has no audio output; rebuild with `--features mpv`");
    }

    let (session, handle) = PlayerSession::new(open_audio, preferences);
    let task = tokio::spawn(session.run());

    let mut episodes = episodes.into_iter();
    handle.send(Command::SetVolume(volume))?;
    handle.send(Command::SetRate(speed))?;
    handle.send(Command::Select(episodes.next()))?;
    for episode in episodes {
        handle.send(Command::Enqueue(episode))?;
    }
    handle.send(Command::SetSleepTimer(sleep))?;

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{wide_msg}\n[{bar:50.cyan/blue}]")
                .unwrap()
                .progress_chars("█▓░"),
        );
        bar
    };

    let mut snapshots = handle.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut started = false;
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();

                bar.set_length(snapshot.duration_seconds as u64);
                bar.set_position(snapshot.progress_seconds as u64);
                bar.set_message(now_playing_line(&snapshot));

                if snapshot.is_playing {
                    started = true;
                } else if started {
                    if snapshot.transport == Some(Transport::Ended) {
                        bar.println(format!("{SUCCESS}Finished"));
                    } else if snapshot.sleep_timer_minutes.is_none() && sleep.is_some() {
                        bar.println(format!("{SLEEP}Sleep timer elapsed"));
                    }
                    break;
                } else if snapshot.current_episode.is_some() {
                    bar.abandon();
                    handle.shutdown().ok();
                    task.await.ok();
                    bail!("playback could not start");
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    bar.finish_and_clear();
    handle.shutdown().ok();
    task.await.context("player session panicked")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::resolve(args.sources.as_deref(), args.data_dir.clone())
        .context("Failed to load configuration")?;

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podheaven".bold().magenta(),
            "- Podcast Player".dimmed()
        );
    }

    let reporter: SharedProgressReporter = if args.quiet {
        TracingReporter::shared()
    } else {
        Arc::new(SpinnerReporter::new())
    };
    let provider = CatalogProvider::new(
        ReqwestClient::new(),
        config.sources.clone(),
        config.cache_ttl,
        reporter,
    );
    let preferences = LikedEpisodes::new(FileStorage::new(config.preferences_path()));

    let catalog = provider
        .catalog()
        .await
        .context("Failed to load podcast feeds")?;

    match args.command {
        Commands::List {
            search,
            creator,
            limit,
        } => {
            if let Some(name) = &creator
                && !catalog.has_creator(name)
            {
                bail!("Unknown creator '{}'", name);
            }

            let filter = EpisodeFilter {
                search_query: search,
                selected_creator: creator,
            };
            let visible = filter.apply(&catalog.episodes);
            let shown = &visible[..visible.len().min(limit)];

            print_episodes(shown, &preferences);
            if visible.len() > shown.len() {
                println!(
                    "\n{}",
                    format!("... and {} more", visible.len() - shown.len()).dimmed()
                );
            }
        }

        Commands::Creators => {
            for creator in &catalog.creators {
                println!(
                    "{} {} episodes ({} published)",
                    creator.name.bold(),
                    creator.episode_count.to_string().cyan(),
                    creator.declared_total
                );
            }
        }

        Commands::Liked => {
            use podheaven::PreferenceStore;

            let liked = podheaven::catalog::liked_episodes(&catalog.episodes, &preferences.load());
            print_episodes(&liked, &preferences);
        }

        Commands::Show { id } => {
            let episode = catalog
                .find(&id)
                .with_context(|| format!("No episode with id '{}'", id))?;
            print_episodes(std::slice::from_ref(episode), &preferences);

            let description = episode.plain_description();
            if !description.trim().is_empty() {
                println!("\n{}", description.trim());
            }
            if episode.live {
                println!("\n{}", "Live now".red().bold());
            }
        }

        Commands::Like { id } => {
            let episode = catalog
                .find(&id)
                .with_context(|| format!("No episode with id '{}'", id))?;

            // Likes never touch the audio output, so the events go nowhere
            let (events, _) = mpsc::unbounded_channel();
            let mut store = PlaybackStore::new(open_audio, preferences, events);

            if store.toggle_like(&id) {
                println!("{HEART}Liked {}", episode.title.bold());
            } else {
                println!("Removed {} from liked episodes", episode.title.bold());
            }
        }

        Commands::Play {
            ids,
            speed,
            volume,
            sleep,
        } => {
            let episodes = ids
                .iter()
                .map(|id| {
                    catalog
                        .find(id)
                        .cloned()
                        .with_context(|| format!("No episode with id '{}'", id))
                })
                .collect::<Result<Vec<_>>>()?;

            play(episodes, preferences, speed, volume, sleep, args.quiet).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_parser_accepts_offered_rates_only() {
        assert_eq!(parse_rate("1.25"), Ok(1.25));
        assert_eq!(parse_rate("2"), Ok(2.0));
        assert!(parse_rate("3").is_err());
        assert!(parse_rate("fast").is_err());
    }

    #[test]
    fn volume_parser_checks_range() {
        assert_eq!(parse_volume("0.5"), Ok(0.5));
        assert!(parse_volume("1.5").is_err());
        assert!(parse_volume("-0.1").is_err());
    }

    #[test]
    fn truncate_title_respects_char_boundaries() {
        assert_eq!(truncate_title("short", 10), "short");
        assert_eq!(truncate_title("ābcdefghij", 6), "ābc...");
    }

    #[test]
    fn args_parse_play_command() {
        let args = Args::parse_from([
            "podheaven", "play", "a", "b", "--speed", "1.5", "--sleep", "10",
        ]);

        match args.command {
            Commands::Play {
                ids, speed, sleep, ..
            } => {
                assert_eq!(ids, vec!["a", "b"]);
                assert_eq!(speed, 1.5);
                assert_eq!(sleep, Some(10));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn args_parse_show_command() {
        let args = Args::parse_from(["podheaven", "show", "abc123"]);

        assert!(matches!(args.command, Commands::Show { id } if id == "abc123"));
    }
}
