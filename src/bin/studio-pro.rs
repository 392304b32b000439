//! CLI for Studio Pro - product photo to studio shot.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use studio_pro::{
    GeminiClientBuilder, GeminiModel, GenerationClient, Settings, Status, StudioController,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "studio-pro")]
#[command(about = "Turn a casual product photo into a studio shot via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a studio shot from a product photo
    Generate(GenerateArgs),

    /// Check that the API key and model are usable
    Check {
        /// Model to check (defaults to the configured one)
        #[arg(long)]
        model: Option<GeminiModel>,
    },

    /// List available models
    Models,
}

#[derive(Args)]
struct GenerateArgs {
    /// Product photo (JPG, PNG or WebP)
    input: PathBuf,

    /// Directory to save the studio shot in
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Model to use (defaults to the configured one)
    #[arg(short, long)]
    model: Option<GeminiModel>,

    /// Generate this many more times after a success, keeping the last shot
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("studio_pro=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.command {
        Commands::Generate(args) => generate(args, settings, cli.json).await,
        Commands::Check { model } => check(model, settings, cli.json).await,
        Commands::Models => list_models(&settings, cli.json),
    }
}

async fn generate(args: GenerateArgs, settings: Settings, json_output: bool) -> anyhow::Result<()> {
    let mut builder = GeminiClientBuilder::from_settings(&settings);
    if let Some(model) = args.model {
        builder = builder.model(model);
    }
    let client = builder.build()?;
    let output_dir = args.output_dir.unwrap_or_else(|| settings.output_dir.clone());

    let mut controller = StudioController::new(client);
    controller.select_file(&args.input)?;

    let mut attempts = 1;
    controller.generate().await;
    for _ in 0..args.retries {
        if !controller.session().can_retry() {
            break;
        }
        attempts += 1;
        controller.retry().await;
    }

    match controller.status().clone() {
        Status::Success(result) => {
            let path = controller.download(&output_dir)?;
            if json_output {
                let out = serde_json::json!({
                    "status": "success",
                    "input": args.input.display().to_string(),
                    "output": path.display().to_string(),
                    "media_type": result.produced_image.media_type(),
                    "size_bytes": result.produced_image.len(),
                    "produced_at": result.produced_at.to_rfc3339(),
                    "model": controller.client().model().as_str(),
                    "attempts": attempts,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "Studio shot saved: {} ({} bytes) via {}",
                    path.display(),
                    result.produced_image.len(),
                    controller.client().name()
                );
            }
            Ok(())
        }
        Status::Failed(message) => {
            if json_output {
                let out = serde_json::json!({
                    "status": "failed",
                    "input": args.input.display().to_string(),
                    "error": message,
                    "attempts": attempts,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            anyhow::bail!("generation failed: {message}")
        }
        other => anyhow::bail!("generation did not run (status: {})", other.label()),
    }
}

async fn check(model: Option<GeminiModel>, settings: Settings, json_output: bool) -> anyhow::Result<()> {
    let mut builder = GeminiClientBuilder::from_settings(&settings);
    if let Some(model) = model {
        builder = builder.model(model);
    }
    let client = builder.build()?;
    let outcome = client.health_check().await;

    if json_output {
        let out = serde_json::json!({
            "model": client.model().as_str(),
            "ok": outcome.is_ok(),
            "error": outcome.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if outcome.is_ok() {
        println!("✓ {} is reachable ({})", client.model(), client.name());
    }

    outcome?;
    Ok(())
}

fn list_models(settings: &Settings, json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ModelInfo {
        id: &'static str,
        default: bool,
    }

    let models: Vec<ModelInfo> = GeminiModel::ALL
        .iter()
        .map(|m| ModelInfo {
            id: m.as_str(),
            default: *m == settings.model,
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        println!("Available models:\n");
        for m in &models {
            let marker = if m.default { "*" } else { " " };
            println!("  {} {}", marker, m.id);
        }
        println!("\nAPI key: GOOGLE_API_KEY");
    }

    Ok(())
}
