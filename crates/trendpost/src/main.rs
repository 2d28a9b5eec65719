//! Trendpost CLI - turn today's trends into a token post.

#![allow(clippy::disallowed_macros)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trendpost::config::{Profile, Settings};
use trendpost::pipeline::{Pipeline, PipelineRun, RunOptions, RunRequest, RunState};
use trendpost::trends::TrendSource;
use trendpost::{Credentials, Publisher, StageError};

/// File a post that failed at submission is kept in, inside the config dir.
const FAILED_POST_FILE: &str = "failed_post.txt";

/// Trendpost CLI - pick a trending topic and post about your token.
#[derive(Parser)]
#[command(name = "trendpost")]
#[command(about = "Trend-based post generation and publishing")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding named profiles
    #[arg(long, global = true, env = "TRENDPOST_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub struct TokenArgs {
    /// Token name (overrides the profile)
    #[arg(long)]
    token_name: Option<String>,

    /// Token description (overrides the profile)
    #[arg(long)]
    token_description: Option<String>,

    /// Image description (overrides the profile)
    #[arg(long)]
    image_description: Option<String>,

    /// File holding a content prompt template (overrides the profile)
    #[arg(long)]
    prompt_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Save a profile built from defaults, flags and TWITTER_* variables
    Save {
        /// Profile name
        name: String,

        #[command(flatten)]
        token: TokenArgs,
    },

    /// Print a saved profile with secrets redacted
    Show {
        /// Profile name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline once
    Run {
        /// Load this saved profile
        #[arg(long)]
        profile: Option<String>,

        #[command(flatten)]
        token: TokenArgs,

        /// Stop after image generation
        #[arg(long)]
        no_publish: bool,

        /// Publish even if image generation failed
        #[arg(long)]
        publish_without_image: bool,
    },

    /// Print the current trend list
    Trends,

    /// Publish a given text (retry after a failed post)
    Post {
        /// Post text
        #[arg(long, required_unless_present = "text_file", conflicts_with = "text_file")]
        text: Option<String>,

        /// Read the post text verbatim from a file
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Load credentials from this saved profile
        #[arg(long)]
        profile: Option<String>,
    },

    /// Manage saved profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("trendpost=debug,info")
    } else {
        EnvFilter::new("trendpost=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut settings = Settings::from_env();
    if let Some(dir) = cli.config_dir {
        settings.config_dir = dir;
    }

    match cli.command {
        Commands::Run {
            profile,
            token,
            no_publish,
            publish_without_image,
        } => {
            let options = RunOptions {
                publish: !no_publish,
                publish_without_image,
            };
            tracing::info!(profile = ?profile, publish = options.publish, "Starting run");
            run_pipeline(&settings, profile.as_deref(), &token, options).await
        }
        Commands::Trends => run_trends(&settings).await,
        Commands::Post {
            text,
            text_file,
            profile,
        } => {
            let text = match (text, text_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read post text {}", path.display()))?,
                (None, None) => anyhow::bail!("--text or --text-file is required"),
            };
            run_post(&settings, &text, profile.as_deref()).await
        }
        Commands::Profile { command } => match command {
            ProfileCommand::Save { name, token } => save_profile(&settings, &name, &token),
            ProfileCommand::Show { name } => show_profile(&settings, &name),
        },
    }
}

/// Profile from disk (or defaults) with flag and environment overrides applied.
fn resolve_profile(settings: &Settings, name: Option<&str>, token: &TokenArgs) -> Result<Profile> {
    let mut profile = match name {
        Some(name) => Profile::load_named(&settings.config_dir, name)?,
        None => Profile::default(),
    };

    if let Some(v) = &token.token_name {
        profile.token_name.clone_from(v);
    }
    if let Some(v) = &token.token_description {
        profile.token_description.clone_from(v);
    }
    if let Some(v) = &token.image_description {
        profile.image_description.clone_from(v);
    }
    if let Some(path) = &token.prompt_file {
        profile.prompt = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?;
    }
    profile.credentials = profile.credentials.with_env_overrides();

    Ok(profile)
}

async fn run_pipeline(
    settings: &Settings,
    profile: Option<&str>,
    token: &TokenArgs,
    options: RunOptions,
) -> Result<()> {
    let profile = resolve_profile(settings, profile, token)?;
    let pipeline = Pipeline::new(settings)?;

    println!("{} {}\n", "🚀 Trendpost run for".bold(), profile.token_name.cyan());

    let request = RunRequest {
        token: profile.token(),
        image_description: profile.image_description,
        prompt: profile.prompt,
        credentials: profile.credentials,
        options,
    };

    let run = pipeline.run(&request).await;
    print_run(&run);

    if let Some(error) = run.halted_by() {
        if let (true, Some(content)) = (error.is_retryable(), run.content.as_deref()) {
            let path = save_failed_post(&settings.config_dir, content)?;
            println!("\n   Retry with: {}", retry_command(&path));
        }
        anyhow::bail!("{}", stage_failure(error));
    }

    Ok(())
}

/// Keep the exact text of a failed post for `post --text-file`.
fn save_failed_post(dir: &Path, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(FAILED_POST_FILE);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn retry_command(path: &Path) -> String {
    format!(
        "trendpost post --text-file {}",
        shell_quote(&path.display().to_string())
    )
}

/// Single-quote a word for a POSIX shell.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

fn print_run(run: &PipelineRun) {
    if !run.trends.is_empty() {
        let labels: Vec<_> = run.trends.iter().map(ToString::to_string).collect();
        println!("📈 {} trends: {}", run.trends.len(), labels.join(", ").dimmed());
    }

    if let Some(selection) = &run.selection {
        if let Some(trend) = selection.trend() {
            println!("🎯 Selected: {}", trend.to_string().green().bold());
        }
        println!("   {}", selection.explanation());
    }

    if !run.context.is_empty() {
        println!("🔍 Context: {}", run.context.dimmed());
    }

    if let Some(content) = &run.content {
        println!(
            "\n📝 Post ({} chars):\n{}\n",
            content.chars().count(),
            content
        );
    }

    if let Some(url) = &run.image_url {
        println!("🖼  Image: {url}");
    }

    for failure in &run.failures {
        let line = stage_failure(failure);
        if failure.is_hard_stop() {
            eprintln!("❌ {}", line.red());
        } else {
            eprintln!("⚠️  {}", line.yellow());
        }
    }

    match run.state {
        RunState::Posted => {
            if let Some(receipt) = &run.receipt {
                println!("✅ Posted {} at {}", receipt.url.green(), receipt.posted_at);
            }
        }
        RunState::ImageGenerated | RunState::ContentGenerated => {
            println!("📭 Not published");
        }
        _ => {}
    }
}

fn stage_failure(error: &StageError) -> String {
    format!("[{}] {error}", error.stage())
}

async fn run_trends(settings: &Settings) -> Result<()> {
    let source = TrendSource::new(settings.trends_url.clone())?;
    let trends = source
        .fetch()
        .await
        .map_err(|e| anyhow::anyhow!(stage_failure(&e)))?;

    if trends.is_empty() {
        println!("No trends found.");
        return Ok(());
    }

    println!("📈 Current trends\n");
    for (rank, trend) in trends.iter().enumerate() {
        println!("{:>3}. {trend}", rank + 1);
    }

    Ok(())
}

async fn run_post(settings: &Settings, text: &str, profile: Option<&str>) -> Result<()> {
    let credentials = match profile {
        Some(name) => Profile::load_named(&settings.config_dir, name)?
            .credentials
            .with_env_overrides(),
        None => Credentials::from_env(),
    };

    let publisher = Publisher::new(settings.twitter_api_base.clone());
    match publisher.publish(&credentials, text).await {
        Ok(receipt) => {
            println!("✅ Posted {}", receipt.url.green());
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {}", stage_failure(&e).red());
            anyhow::bail!("post not published")
        }
    }
}

fn save_profile(settings: &Settings, name: &str, token: &TokenArgs) -> Result<()> {
    let profile = resolve_profile(settings, None, token)?;
    let path = profile.save_named(&settings.config_dir, name)?;
    println!("✅ Profile saved to: {}", path.display());

    let missing = profile.credentials.missing_fields();
    if !missing.is_empty() {
        println!("   {} {}", "Missing credentials:".yellow(), missing.join(", "));
    }
    Ok(())
}

fn show_profile(settings: &Settings, name: &str) -> Result<()> {
    let profile = Profile::load_named(&settings.config_dir, name)?;

    println!("{} {}", "Profile".bold(), name.cyan());
    println!("   Token: {}", profile.token_name);
    println!("   Description: {}", profile.token_description);
    println!("   Image: {}", profile.image_description);
    println!("   Credentials: {:?}", profile.credentials);
    println!("   Prompt:\n{}", profile.prompt.dimmed());
    Ok(())
}
