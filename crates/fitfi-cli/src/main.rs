use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio_stream::StreamExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use fitfi_core::{load_config, FitfiConfig, TracingSink};
use fitfi_fusion::{archetype_ids, format_blend_string, fusion_score, ProductProfile};
use fitfi_nova::{NovaClient, NovaConfig};
use fitfi_schema::{ChatMessage, ChatMode, StreamEvent};

#[derive(Parser)]
#[command(name = "fitfi", version, about = "FitFi style engine CLI")]
struct Cli {
    #[arg(long, default_value = "fitfi.yaml", help = "Path to the config file")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Stream one chat turn from the Nova assistant")]
    Chat {
        prompt: String,
        #[arg(long, help = "Conversation mode: chat or outfits")]
        mode: Option<String>,
    },
    #[command(about = "Rank a product catalog against an archetype blend")]
    Rank {
        #[arg(long, help = "Catalog JSON file (defaults to catalog.path from config)")]
        catalog: Option<PathBuf>,
        #[arg(long = "blend", value_parser = parse_blend_pair, help = "Archetype weight, e.g. klassiek=2 (repeatable)")]
        blend: Vec<(String, f32)>,
        #[arg(long, default_value = "10")]
        top: usize,
    },
    #[command(about = "Print the human-readable blend for a weight mixture")]
    Blend {
        #[arg(long = "blend", value_parser = parse_blend_pair, required = true)]
        blend: Vec<(String, f32)>,
    },
}

/// A catalog entry: display fields plus the scoring-relevant tags.
#[derive(Debug, Deserialize)]
struct CatalogItem {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(flatten)]
    profile: ProductProfile,
}

fn parse_blend_pair(raw: &str) -> std::result::Result<(String, f32), String> {
    let (id, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected archetype=weight, got: {raw}"))?;
    let weight: f32 = weight
        .parse()
        .map_err(|_| format!("invalid weight in: {raw}"))?;
    Ok((id.trim().to_string(), weight))
}

fn parse_mode(raw: &str) -> Result<ChatMode> {
    match raw {
        "chat" => Ok(ChatMode::Chat),
        "outfits" => Ok(ChatMode::Outfits),
        other => Err(anyhow!(
            "unknown mode: {other} (expected chat or outfits)"
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { prompt, mode } => run_chat(&cli.config, prompt, mode).await,
        Commands::Rank {
            catalog,
            blend,
            top,
        } => run_rank(&cli.config, catalog, blend, top),
        Commands::Blend { blend } => {
            println!("{}", format_blend_string(&blend.into_iter().collect()));
            Ok(())
        }
    }
}

async fn run_chat(config_path: &PathBuf, prompt: String, mode: Option<String>) -> Result<()> {
    let config = load_config(config_path, &archetype_ids())?;
    let mode = match mode {
        Some(raw) => parse_mode(&raw)?,
        None => parse_mode(&config.nova.mode)?,
    };

    let nova_config =
        NovaConfig::new(config.nova.base_url.clone()).with_streaming(config.nova.streaming);
    let client = NovaClient::new(nova_config, Arc::new(TracingSink));

    let mut stream = client.stream_chat(mode, vec![ChatMessage::user(prompt)]);
    let mut last = None;
    while let Some(event) = stream.next().await {
        match &event {
            StreamEvent::Content { text } => {
                print!("{text}");
                std::io::stdout().flush().ok();
            }
            StreamEvent::Products { products } => {
                println!();
                for product in products {
                    println!(
                        "  [{}] {} {}",
                        product.id,
                        product.title.as_deref().unwrap_or("(zonder titel)"),
                        product
                            .price
                            .map(|price| format!("€{price:.2}"))
                            .unwrap_or_default(),
                    );
                }
            }
            StreamEvent::Done => println!(),
            StreamEvent::Error => tracing::warn!("stream error event"),
        }
        last = Some(event);
    }

    if last == Some(StreamEvent::Error) {
        bail!("nova stream ended with an error");
    }
    Ok(())
}

fn run_rank(
    config_path: &PathBuf,
    catalog: Option<PathBuf>,
    blend: Vec<(String, f32)>,
    top: usize,
) -> Result<()> {
    // Config is only consulted for defaults the CLI did not provide.
    let config: Option<FitfiConfig> = if blend.is_empty() || catalog.is_none() {
        Some(load_config(config_path, &archetype_ids())?)
    } else {
        None
    };

    let weights: HashMap<String, f32> = if blend.is_empty() {
        config
            .as_ref()
            .map(|config| config.fusion.default_blend.clone())
            .unwrap_or_default()
    } else {
        blend.into_iter().collect()
    };
    if weights.is_empty() {
        bail!("no blend given and no fusion.default_blend in config");
    }

    let catalog_path = match catalog {
        Some(path) => path,
        None => config
            .as_ref()
            .and_then(|config| config.catalog.path.as_ref())
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("no --catalog given and no catalog.path in config"))?,
    };

    let raw = std::fs::read_to_string(&catalog_path)
        .with_context(|| format!("failed to read catalog: {}", catalog_path.display()))?;
    let items: Vec<CatalogItem> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse catalog: {}", catalog_path.display()))?;

    let mut ranked: Vec<(CatalogItem, fitfi_fusion::FusionScoreDetail)> = items
        .into_iter()
        .map(|item| {
            let detail = fusion_score(&item.profile, &weights);
            (item, detail)
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.1.total_score
            .partial_cmp(&a.1.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.id.cmp(&b.0.id))
    });

    println!("blend: {}", format_blend_string(&weights));
    for (item, detail) in ranked.iter().take(top) {
        println!(
            "{:>5.2}  {}  {}",
            detail.total_score,
            item.id,
            item.title.as_deref().unwrap_or(""),
        );
        if !detail.matched_signals.is_empty() {
            println!("       {}", detail.matched_signals.join(", "));
        }
    }
    Ok(())
}
