// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use futures::future::join_all;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use captionlex::app_config::{Config, LogLevel};
use captionlex::caption::KnownState;
use captionlex::dictionary::{self, DictionaryGateway, DictionaryStore, SqliteStore};
use captionlex::language_utils;
use captionlex::providers::Translator;
use captionlex::providers::google::GoogleTranslate;
use captionlex::surface::{Document, ElementSpec, MediaElement, MutationKind, NodeId, Surface};
use captionlex::{Controller, ExecutionContext, TranslationService, normalize};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Annotate caption lines (one caption per line) from a file or stdin
    Annotate {
        /// Caption file; reads stdin when omitted
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Manage saved words
    Words {
        #[command(subcommand)]
        command: WordsCommand,
    },

    /// Translate a text through the configured service
    Translate {
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Turn caption annotation on
    Enable,

    /// Turn caption annotation off
    Disable,

    /// Generate shell completions for captionlex
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum WordsCommand {
    /// List saved words with their translation
    List,

    /// Translate words and save them
    Add {
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Remove a saved word
    Remove { word: String },

    /// Export saved words as an Anki CSV file
    Export {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

/// captionlex - vocabulary overlay for streaming captions
///
/// Marks every word of incoming captions as known or unknown against a
/// personal vocabulary, and manages that vocabulary.
#[derive(Parser, Debug)]
#[command(name = "captionlex")]
#[command(version)]
#[command(about = "Vocabulary overlay for streaming captions")]
#[command(long_about = "captionlex annotates caption text with your vocabulary: unknown words are shown in [brackets].

EXAMPLES:
    captionlex annotate captions.txt             # Annotate a caption file
    cat captions.txt | captionlex annotate       # Annotate from stdin
    captionlex words add hola                    # Translate and save a word
    captionlex words export anki.csv             # Export for Anki
    captionlex -t fr translate bonjour           # One-off lookup into French
    captionlex completions bash > captionlex.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    target_language: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Prefix and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (prefix, colour) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                prefix,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at info; the config may change it below
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "captionlex", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Annotate { input } => run_annotate(config, input.as_deref()).await,
        Commands::Words { command } => run_words(config, command).await,
        Commands::Translate { text } => {
            let context = ExecutionContext::new();
            let service = translation_service(&config, context)?;
            println!("{}", service.translate(&text).await);
            Ok(())
        }
        Commands::Enable => set_enabled(&config, true).await,
        Commands::Disable => set_enabled(&config, false).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load the config file, apply CLI overrides and validate
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(Path::new(&cli.config_path))?;

    if let Some(level) = cli.log_level.clone() {
        config.log_level = level.into();
    }
    if let Some(target_language) = &cli.target_language {
        config.target_language = target_language.clone();
    }
    log::set_max_level(config.log_level.into());

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let store = match &config.dictionary.path {
        Some(path) => SqliteStore::open(path)?,
        None => SqliteStore::open_default()?,
    };
    Ok(Arc::new(store))
}

fn translator(config: &Config) -> Result<Arc<dyn Translator>> {
    Ok(Arc::new(GoogleTranslate::new(
        config.translation.endpoint.clone(),
        language_utils::to_request_code(&config.source_language)?,
        language_utils::to_request_code(&config.target_language)?,
        Duration::from_secs(config.translation.timeout_secs),
    )?))
}

fn translation_service(config: &Config, context: ExecutionContext) -> Result<TranslationService> {
    Ok(TranslationService::new(
        translator(config)?,
        context,
        config.source_language.clone(),
        config.target_language.clone(),
        &config.translation,
    ))
}

async fn set_enabled(config: &Config, enabled: bool) -> Result<()> {
    let gateway = DictionaryGateway::new(open_store(config)?, ExecutionContext::new());
    if !gateway.set_enabled(enabled).await {
        return Err(anyhow!("Failed to update the enabled flag"));
    }
    info!("Caption annotation {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

async fn run_words(config: Config, command: WordsCommand) -> Result<()> {
    let context = ExecutionContext::new();
    let gateway = DictionaryGateway::new(open_store(&config)?, context.clone());

    match command {
        WordsCommand::List => {
            let snapshot = gateway.load_snapshot().await;
            if snapshot.is_empty() {
                println!("No saved words yet.");
            }
            for (word, record) in snapshot.iter() {
                let added = chrono::DateTime::from_timestamp_millis(record.added_at)
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!("{}\t{}\t{}", word, record.translation, added);
            }
        }
        WordsCommand::Add { words } => {
            if let Some(raw) = words.iter().find(|word| !normalize(word).is_actionable()) {
                return Err(anyhow!("Nothing to save for '{}': the word has no letters", raw));
            }
            let words: Vec<_> = words.iter().map(|word| normalize(word)).collect();

            let service = translation_service(&config, context)?;
            let lookups = join_all(words.iter().map(|word| service.translate(word.as_str()))).await;

            // Saves rewrite the whole mapping, so they must not overlap
            for (word, lookup) in words.iter().zip(lookups) {
                if lookup.is_failure() {
                    return Err(anyhow!("Translation failed for '{}': {}", word, lookup));
                }
                if !gateway.save(word, lookup.text()).await {
                    return Err(anyhow!("Failed to save '{}'", word));
                }
                println!("{}\t{}", word, lookup);
            }
        }
        WordsCommand::Remove { word } => {
            let word = normalize(&word);
            if gateway.remove(&word).await {
                info!("Removed '{}'", word);
            } else {
                warn!("'{}' is not in the dictionary", word);
            }
        }
        WordsCommand::Export { path } => {
            let snapshot = gateway.load_snapshot().await;
            std::fs::write(&path, dictionary::export_csv(&snapshot))
                .with_context(|| format!("Failed to write export file: {:?}", path))?;
            info!("Exported {} words to {:?}", snapshot.len(), path);
        }
    }
    Ok(())
}

/// Feed caption lines into an in-memory player and print each annotated line
async fn run_annotate(config: Config, input: Option<&Path>) -> Result<()> {
    let store = open_store(&config)?;
    let context = ExecutionContext::new();
    if !DictionaryGateway::new(store.clone(), context.clone()).is_enabled().await {
        warn!("Caption annotation is disabled, run `captionlex enable` first");
    }

    let document = Arc::new(Document::new());
    let media = Arc::new(MediaElement::new(false));
    document.set_media(media.clone());
    let body = document.append(document.root(), ElementSpec::new("body"))?;
    let player = document.append(body, ElementSpec::new("div").id("movie_player"))?;
    let window = document.append(player, ElementSpec::new("div").class("caption-window"))?;

    let provider = translator(&config)?;
    let controller = Controller::new(
        config,
        document.clone(),
        store as Arc<dyn DictionaryStore>,
        provider,
        context,
    )?;
    controller.start().await?;

    let reader: Box<dyn AsyncBufRead + Unpin> = match input {
        Some(path) => Box::new(BufReader::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open caption file: {:?}", path))?,
        )),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let mut lines = reader.lines();

    let mut previous: Option<NodeId> = None;
    let mut index = 0u32;
    while let Some(line) = lines.next_line().await? {
        media.set_current_time(f64::from(index));
        index += 1;

        let mut subscription = document.subscribe();
        let segment = document.append(window, ElementSpec::new("span").class("ytp-caption-segment").text(&line))?;
        if let Some(old) = previous.replace(segment) {
            document.remove(old)?;
        }

        if controller.state().is_observing() && !line.is_empty() {
            let rewritten = tokio::time::timeout(Duration::from_secs(5), async {
                while let Some(record) = subscription.receiver.recv().await {
                    if record.kind == MutationKind::ChildList && record.target == segment {
                        return true;
                    }
                }
                false
            })
            .await
            .unwrap_or(false);
            if !rewritten {
                warn!("Caption was not annotated in time: {}", line);
            }
        }
        println!("{}", render_segment(&document, segment));
    }

    controller.teardown().await;
    Ok(())
}

/// Unknown words in brackets, everything else verbatim
fn render_segment(document: &Document, segment: NodeId) -> String {
    document
        .children(segment)
        .into_iter()
        .map(|child| {
            let text = document.text_content(child).unwrap_or_default();
            if !document.is_text(child) && document.has_class(child, KnownState::Unknown.class_name()) {
                format!("[{}]", text)
            } else {
                text
            }
        })
        .collect()
}
