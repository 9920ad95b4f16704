use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use docsum_common::{logger, AppConfig, DocsumError, Result};
use docsum_document::PdfProcessor;
use docsum_llm::{
    build_clients, CustomPrompt, PromptComposer, ProviderId, ProviderRegistry,
    SummarizationOptions, DEFAULT_FORMAT, DEFAULT_TEMPERATURE,
};
use docsum_store::{SummaryStore, TemplateDraft, TemplateStore};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

mod workflow;

use workflow::{SaveOutcome, SummaryRequest, SummaryWorkflow};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "docsum")]
#[command(about = "docsum - AI-powered PDF summarization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a PDF document
    Summarize(SummarizeArgs),

    /// List saved summaries, newest first
    List,

    /// Print a saved summary
    Show {
        /// Summary id
        id: String,
    },

    /// Delete a saved summary
    Delete {
        /// Summary id
        id: String,
    },

    /// Manage prompt templates
    Templates {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Show which providers are configured
    Providers {
        /// Verify credentials against each configured provider
        #[arg(long)]
        check: bool,
    },
}

#[derive(Args)]
struct SummarizeArgs {
    /// PDF file to summarize
    file: PathBuf,

    /// Provider (openai, anthropic, google, ollama)
    #[arg(long, default_value = "openai")]
    provider: ProviderId,

    /// Template id used as summary format
    #[arg(long, default_value = DEFAULT_FORMAT)]
    format: String,

    /// Advisory word limit for the summary
    #[arg(long)]
    max_length: Option<u32>,

    /// Output language
    #[arg(long)]
    language: Option<String>,

    /// Sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// File holding a custom instruction; overrides --format
    #[arg(long)]
    template_file: Option<PathBuf>,

    /// Template variable for the custom instruction
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    vars: Vec<(String, String)>,

    /// Title for the saved summary (defaults to the file name)
    #[arg(long)]
    title: Option<String>,

    /// Do not save the summary
    #[arg(long)]
    no_save: bool,
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List system and user templates
    List,

    /// Create a user template, or edit one with --id
    Add {
        /// Template name
        #[arg(long)]
        name: String,

        /// Instruction text
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        template: Option<String>,

        /// Read instruction text from a file
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        category: Option<String>,

        /// Existing user template to edit
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a user template
    Remove {
        /// Template id
        id: String,
    },
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn read_text_file(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(text)
}

fn build_options(args: &SummarizeArgs) -> Result<SummarizationOptions> {
    let mut options = SummarizationOptions::new(args.provider)
        .with_format(args.format.clone())
        .with_temperature(args.temperature);
    if let Some(language) = &args.language {
        options = options.with_language(language.clone());
    }
    if let Some(words) = args.max_length {
        options = options.with_max_length(words);
    }

    match &args.template_file {
        Some(path) => {
            let variables: BTreeMap<String, String> = args.vars.iter().cloned().collect();
            options = options.with_custom_prompt(CustomPrompt {
                template: read_text_file(path)?,
                variables,
            });
        }
        None if !args.vars.is_empty() => {
            tracing::warn!("--var has no effect without --template-file");
        }
        None => {}
    }

    Ok(options)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn summarize(config: &AppConfig, args: SummarizeArgs) -> Result<()> {
    let templates = TemplateStore::load(&config.templates_path())?;
    let composer = Arc::new(PromptComposer::new(templates.registry()));
    let registry = Arc::new(ProviderRegistry::from_config(config, composer)?);
    let store = Arc::new(RwLock::new(SummaryStore::load(&config.summaries_path())?));

    let request = SummaryRequest {
        options: build_options(&args)?,
        path: args.file,
        title: args.title,
        save: !args.no_save,
    };

    let workflow = SummaryWorkflow::new(PdfProcessor::from_config(config), registry, store);

    let pb = spinner();
    let outcome = workflow
        .execute(&request, &|step| pb.set_message(step.message()))
        .await;
    pb.finish_and_clear();
    let result = outcome?;

    println!("{}", result.summary.summary);

    eprintln!(
        "\n{} pages, {} chunks, {} tokens ({} / {})",
        result.page_count,
        result.chunk_count,
        result.summary.tokens_used,
        result.summary.provider,
        result.summary.model
    );
    match result.save {
        SaveOutcome::Saved(stored) => eprintln!("Saved as {}", stored.id),
        SaveOutcome::Skipped => {}
        SaveOutcome::Failed(e) => {
            eprintln!("Summary was not saved: {}", e);
            return Err(e);
        }
    }

    Ok(())
}

fn list(config: &AppConfig) -> Result<()> {
    let store = SummaryStore::load(&config.summaries_path())?;
    if store.is_empty() {
        println!("No saved summaries.");
        return Ok(());
    }

    for summary in store.list_all() {
        let provider = summary
            .metadata
            .as_ref()
            .and_then(|m| m.provider)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {:<14} {:<10} {}",
            summary.id,
            summary.created_at.format("%Y-%m-%d %H:%M"),
            summary.format,
            provider,
            summary.title
        );
    }
    Ok(())
}

fn show(config: &AppConfig, id: &str) -> Result<()> {
    let store = SummaryStore::load(&config.summaries_path())?;
    let summary = store
        .get(id)
        .ok_or_else(|| DocsumError::not_found(format!("Summary '{}'", id)))?;

    println!("# {}\n", summary.title);
    println!("{}", summary.content);
    Ok(())
}

fn delete(config: &AppConfig, id: &str) -> Result<()> {
    let mut store = SummaryStore::load(&config.summaries_path())?;
    if !store.delete_by_id(id)? {
        return Err(DocsumError::not_found(format!("Summary '{}'", id)));
    }
    println!("Deleted {}", id);
    Ok(())
}

fn templates(config: &AppConfig, command: TemplateCommands) -> Result<()> {
    let mut store = TemplateStore::load(&config.templates_path())?;

    match command {
        TemplateCommands::List => {
            for template in store.list_templates() {
                let kind = if template.is_system_template { "system" } else { "user" };
                println!("{:<22} {:<7} {}", template.id, kind, template.name);
            }
        }
        TemplateCommands::Add {
            name,
            template,
            file,
            description,
            category,
            id,
        } => {
            let template = match (template, file) {
                (Some(text), _) => text,
                (None, Some(path)) => read_text_file(&path)?,
                (None, None) => {
                    return Err(DocsumError::invalid_input("Template text is required"))
                }
            };
            let saved = store.save_user_template(TemplateDraft {
                id,
                name,
                description,
                template,
                category,
                options: Vec::new(),
            })?;
            println!("Saved template {}", saved.id);
        }
        TemplateCommands::Remove { id } => {
            if !store.delete_user_template(&id)? {
                return Err(DocsumError::not_found(format!("Template '{}'", id)));
            }
            println!("Deleted template {}", id);
        }
    }
    Ok(())
}

async fn providers(config: &AppConfig, check: bool) -> Result<()> {
    for client in build_clients(config)? {
        let provider = client.provider();
        if !client.has_credentials() {
            println!("{:<10} not configured", provider);
            continue;
        }

        if !check {
            println!("{:<10} configured ({})", provider, client.model());
            continue;
        }

        let status = match client.test_connection().await {
            Ok(true) => "ok".to_string(),
            Ok(false) => "rejected".to_string(),
            Err(e) => format!("unreachable: {}", e),
        };
        println!("{:<10} {} ({})", provider, status, client.model());
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env()?;
    logger::setup_logging(&config.log_dir, &config.log_level)?;

    tracing::debug!("docsum starting - Data: {}", config.data_dir.display());

    match cli.command {
        Commands::Summarize(args) => summarize(&config, args).await,
        Commands::List => list(&config),
        Commands::Show { id } => show(&config, &id),
        Commands::Delete { id } => delete(&config, &id),
        Commands::Templates { command } => templates(&config, command),
        Commands::Providers { check } => providers(&config, check).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load environment variables from .env at project root before config
    load_dotenv_from_project_root();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
