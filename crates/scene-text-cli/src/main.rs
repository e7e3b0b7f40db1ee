//! scenetext CLI - describe the text found in images with Gemini
//!
//! Usage:
//!     scenetext [OPTIONS] [IMAGES]...
//!
//! Environment Variables:
//!     GEMINI_API_KEY: API key for the Gemini API (required)
//!     GEMINI_MODEL: Model name (default: gemini-1.5-pro)
//!     GEMINI_BASE_URL: API endpoint root (default: https://generativelanguage.googleapis.com/v1beta)
//!     SCENE_TEXT_CONCURRENCY: Maximum requests in flight (default: 8)
//!     RUST_LOG: Log filter (default: info, or warn with --quiet)
//!
//! Variables may also be set in a `.env` file in the working directory or
//! one of its parents. Values already in the process environment win.

use anyhow::{bail, Context, Result};
use clap::Parser;
use scene_text::{
    default_templates, list_supported_models, BatchDispatcher, DescriptionTemplates,
    ModelClient, ModelConfig, PredictionResult, SceneTextError,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Scene text - describe the text visible in images
#[derive(Parser, Debug)]
#[command(name = "scenetext")]
#[command(about = "Describe the text visible in images using Gemini")]
#[command(after_help = r#"Examples:
    # Describe a single image
    scenetext data/016.jpg

    # Describe many images, 4 requests at a time
    scenetext --concurrency 4 data/*.jpg

    # Use custom position templates
    scenetext --templates templates.json photo.png

    # Show errors instead of empty results
    scenetext --strict photo.png

    # Send a text-only prompt
    scenetext --text "Summarize what scene text recognition is"

    # List supported models
    scenetext --list-models
"#)]
struct Cli {
    // Model options
    /// API key for the Gemini API
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name
    #[arg(long, env = "GEMINI_MODEL", default_value = scene_text::model::DEFAULT_MODEL)]
    model: String,

    /// API endpoint root
    #[arg(long, env = "GEMINI_BASE_URL", default_value = scene_text::model::DEFAULT_BASE_URL)]
    base_url: String,

    /// Maximum output tokens per request
    #[arg(long, default_value_t = 4096)]
    max_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value_t = 1e-4)]
    temperature: f32,

    /// Nucleus sampling value
    #[arg(long, default_value_t = scene_text::model::DEFAULT_TOP_P)]
    top_p: f32,

    // Prediction options
    /// File containing the prompt sent with every image
    #[arg(long, value_name = "FILE")]
    prompt_file: Option<PathBuf>,

    /// JSON file mapping positions to templates, e.g. {"top": "At the top: {}"}.
    /// The first {} receives the texts; write {{ and }} for literal braces
    #[arg(long, value_name = "FILE")]
    templates: Option<PathBuf>,

    /// MIME type for every image (default: guessed from the file extension)
    #[arg(long)]
    mime_type: Option<String>,

    /// Maximum requests in flight
    #[arg(long, env = "SCENE_TEXT_CONCURRENCY", default_value_t = scene_text::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-image timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print an error object for failed images instead of an empty result
    #[arg(long)]
    strict: bool,

    /// Send a text-only prompt and print the reply
    #[arg(long, conflicts_with = "images")]
    text: Option<String>,

    // Other options
    /// Check that the model API is reachable before running
    #[arg(long)]
    check: bool,

    /// List supported models and exit
    #[arg(long)]
    list_models: bool,

    /// Suppress informational logging
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Image files to describe
    images: Vec<PathBuf>,
}

/// Load variables from a `.env` file without overriding the process environment
///
/// With no path, `.env` is searched for from the working directory upwards.
/// Returns the file that was loaded, if any.
fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_supported_models() {
    println!("Supported models:");
    for model in list_supported_models() {
        println!("  - {}", model);
    }
}

/// Build the model config from CLI arguments
fn build_model_config(args: &Cli) -> Result<ModelConfig> {
    let Some(api_key) = args.api_key.as_deref() else {
        bail!("No API key given. Set GEMINI_API_KEY or pass --api-key.");
    };

    let mut config = ModelConfig::new(api_key, &args.model)
        .with_base_url(&args.base_url)
        .with_max_tokens(args.max_tokens)
        .with_temperature(args.temperature)
        .with_top_p(args.top_p);

    if let Some(prompt_file) = &args.prompt_file {
        let prompt = std::fs::read_to_string(prompt_file)
            .with_context(|| format!("Failed to read prompt file {}", prompt_file.display()))?;
        config = config.with_prompt(prompt);
    }

    if let Some(mime_type) = &args.mime_type {
        config = config.with_mime_type(mime_type);
    }

    if let Some(secs) = args.timeout {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

fn load_templates(args: &Cli) -> Result<DescriptionTemplates> {
    match &args.templates {
        Some(path) => DescriptionTemplates::from_json_file(path)
            .with_context(|| format!("Failed to load templates from {}", path.display())),
        None => Ok(default_templates()),
    }
}

/// Check model API connectivity
async fn check_model_api(client: &ModelClient) -> bool {
    let base_url = &client.config().base_url;
    tracing::info!("Checking API connectivity ({})", base_url);

    match client.test_connection().await {
        Ok(_) => {
            tracing::info!("Model API check passed");
            true
        }
        Err(SceneTextError::Transport(e)) if e.is_connect() => {
            tracing::error!("Cannot connect to {}: {}", base_url, e);
            false
        }
        Err(SceneTextError::Transport(e)) if e.is_timeout() => {
            tracing::error!("Connection to {} timed out", base_url);
            false
        }
        Err(e) => {
            tracing::error!("Model API check failed: {}", e);
            false
        }
    }
}

fn error_json(image: &std::path::Path, error: &SceneTextError) -> serde_json::Value {
    json!({
        "image": image.display().to_string(),
        "error": error.to_string(),
    })
}

async fn run_batch(args: &Cli, client: &ModelClient) -> Result<bool> {
    let mut dispatcher = BatchDispatcher::new(args.concurrency)?;
    if let Some(secs) = args.timeout {
        dispatcher = dispatcher.with_task_timeout(Duration::from_secs(secs));
    }

    let mut all_ok = true;
    if args.strict {
        for (image, result) in args
            .images
            .iter()
            .zip(client.batch_predict(args.images.as_slice(), &dispatcher).await)
        {
            let line = match result {
                Ok(prediction) => serde_json::to_string(&prediction)?,
                Err(e) => {
                    all_ok = false;
                    error_json(image, &e).to_string()
                }
            };
            println!("{}", line);
        }
    } else {
        let results: Vec<PredictionResult> =
            client.batch_predict_or_empty(args.images.as_slice(), &dispatcher).await;
        for result in results {
            println!("{}", serde_json::to_string(&result)?);
        }
    }
    Ok(all_ok)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before parsing so clap's env fallbacks see the file
    let env_file = load_env_file(None);
    let args = Cli::parse();
    init_logging(args.quiet);

    if let Some(path) = &env_file {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    // Handle --list-models (no API key needed)
    if args.list_models {
        print_supported_models();
        return Ok(());
    }

    if args.text.is_none() && args.images.is_empty() {
        bail!("Nothing to do. Pass one or more image paths or --text.");
    }

    let config = build_model_config(&args)?;
    let templates = load_templates(&args)?;
    let client = ModelClient::new(config)
        .context("Invalid model configuration")?
        .with_templates(templates);

    tracing::info!(
        "Model: {} ({})",
        client.config().model_name,
        client.config().base_url
    );

    if args.check && !check_model_api(&client).await {
        std::process::exit(1);
    }

    if let Some(prompt) = &args.text {
        let response = client.generate_text(prompt).await?;
        println!("{}", response.text);
        tracing::debug!("Usage: {}", serde_json::to_string(&response.usage)?);
        return Ok(());
    }

    if !run_batch(&args, &client).await? {
        std::process::exit(1);
    }

    Ok(())
}
