use anyhow::{Context, Result};
use chrono::Utc;
use std::env;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

// Use library instead of local modules
use anpr_badge::observability::init_tracing;
use anpr_badge::validation::known_municipality;
use anpr_badge::{
    resolve, BadgeConfig, BadgeService, EntityIdentifier, HttpRegistryClient, RawRegistryRecord,
    SvgBadgeRenderer,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("resolve"), Some(file)) => run_resolve(Path::new(file))?,
        (Some("render"), Some(code)) => run_render(code).await?,
        _ => print_usage(),
    }

    Ok(())
}

fn print_usage() {
    println!("anpr-badge {}", anpr_badge::VERSION);
    println!();
    println!("USAGE:");
    println!("  anpr-badge resolve <file.json>     Classify a saved registry payload");
    println!("  anpr-badge render <codice|name>    Fetch from the registry, print the SVG badge");
    println!();
    println!("Known names: latina, bergamo, sezze");
}

/// Classify a registry payload saved on disk
fn run_resolve(path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let record = RawRegistryRecord::from_json(json)
        .with_context(|| format!("{} is not a registry payload", path.display()))?;

    let status = resolve(&record, Utc::now())?;

    println!("🏛️  {}", status.display_name);
    println!("   state: {}", status.state.name());
    println!("   label: {}", status.label);
    println!("   color: {}", status.color.name());
    println!("   icon:  {}", status.icon.url());

    Ok(())
}

/// Fetch live data and write the SVG to stdout
async fn run_render(name_or_code: &str) -> Result<()> {
    let config = BadgeConfig::from_env()?;
    init_tracing(&config.log_filter);

    let identifier = EntityIdentifier::parse(known_municipality(name_or_code))?;
    let registry = HttpRegistryClient::new(&config.registry_url, config.upstream_timeout)?;
    let service = BadgeService::new(
        Arc::new(registry),
        Arc::new(SvgBadgeRenderer::new()),
        config.embed_logo,
    );

    let image = service.handle(&identifier, Utc::now()).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&image.bytes)?;
    writeln!(stdout)?;

    Ok(())
}
