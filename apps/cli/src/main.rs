use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tubemind_core::{
    AnalysisClient, Controller, JsonFileStore, Provider, get_root_data_dir,
};

mod commands;

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Parser)]
#[command(name = "tubemind")]
#[command(about = "Turn YouTube videos into actionable notes and keep them in a local library")]
struct Cli {
    /// AI provider used for video analysis
    #[arg(short, long, global = true, default_value = "gemini")]
    provider: CliProvider,

    /// Override the provider's default model
    #[arg(long, global = true)]
    model: Option<String>,

    /// Directory holding the insight library
    #[arg(long, global = true, env = "TUBEMIND_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List saved insights, most recent first
    List {
        /// Case-insensitive text matched against titles and summaries
        #[arg(short, long)]
        search: Option<String>,

        /// Only show insights carrying this tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// List every tag in the library
    Tags,

    /// Analyze a video and save the result to the library
    Analyze {
        /// Video URL
        url: String,

        /// File with a transcript or notes for the video
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Replace the analyzed title
        #[arg(long)]
        title: Option<String>,

        /// Replace the analyzed summary
        #[arg(long)]
        summary: Option<String>,

        /// Tag to add to the draft (repeatable)
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,

        /// Suggested tag to drop from the draft (repeatable)
        #[arg(long = "remove-tag")]
        remove_tags: Vec<String>,

        /// Extra action item to append (repeatable)
        #[arg(long = "add-action")]
        add_actions: Vec<String>,

        /// Drop the analyzed action item at this 1-based position (repeatable)
        #[arg(long = "remove-action")]
        remove_actions: Vec<usize>,

        /// Print the draft without saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show one insight
    Show {
        /// Insight id or unique prefix
        id: String,
    },

    /// Mark an action item done, or not done
    Toggle {
        /// Insight id or unique prefix
        id: String,

        /// Action item id or unique prefix
        item_id: String,
    },

    /// Edit the tags of an insight
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Delete an insight
    Delete {
        /// Insight id or unique prefix
        id: String,
    },
}

#[derive(Subcommand)]
enum TagAction {
    Add { id: String, tag: String },
    Remove { id: String, tag: String },
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TUBEMIND_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let provider: Provider = cli.provider.into();
    let data_dir = cli.data_dir.unwrap_or_else(get_root_data_dir);
    tracing::debug!(data_dir = %data_dir.display(), provider = provider.name(), "starting");

    let mut client = AnalysisClient::new(provider, provider.api_key_from_env());
    if let Some(model) = cli.model {
        client = client.with_model(model);
    }

    let mut controller = Controller::new(JsonFileStore::new(data_dir), client).await;

    match cli.command {
        Command::List { search, tags } => commands::list(&controller, search, tags),
        Command::Tags => commands::tags(&controller),
        Command::Analyze {
            url,
            transcript,
            title,
            summary,
            add_tags,
            remove_tags,
            add_actions,
            remove_actions,
            dry_run,
        } => {
            let edits = commands::DraftEdits {
                title,
                summary,
                add_tags,
                remove_tags,
                add_actions,
                remove_actions,
            };
            commands::analyze(&mut controller, &url, transcript, edits, dry_run).await
        }
        Command::Show { id } => commands::show(&mut controller, &id).await,
        Command::Toggle { id, item_id } => commands::toggle(&mut controller, &id, &item_id).await,
        Command::Tag { action } => match action {
            TagAction::Add { id, tag } => commands::tag(&mut controller, &id, &tag, true).await,
            TagAction::Remove { id, tag } => commands::tag(&mut controller, &id, &tag, false).await,
        },
        Command::Delete { id } => commands::delete(&mut controller, &id).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
