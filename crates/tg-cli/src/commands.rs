use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use tg_server::{GatewayConfig, GatewayServer};
use tg_store::{BlobStore, FsBlobStore, FsReductionCache, ReductionCache, StoreLayout};
use tg_types::ContentHash;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = GatewayConfig::load(cli.config.as_deref()).context("loading configuration")?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Lookup(args) => cmd_lookup(&config, args, &cli.format),
        Command::Stat(args) => cmd_stat(&config, args, &cli.format),
        Command::Config => cmd_config(&config, &cli.format),
    }
}

async fn cmd_serve(mut config: GatewayConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    tracing::info!(
        base_dir = %config.base_dir.display(),
        executor = %config.executor_path.display(),
        "starting thunk gateway"
    );
    GatewayServer::new(config)?.serve().await?;
    Ok(())
}

fn cmd_lookup(config: &GatewayConfig, args: LookupArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let thunk = ContentHash::new(args.thunk)?;
    let cache = FsReductionCache::new(StoreLayout::new(&config.base_dir));
    let result = cache.lookup(&thunk, &args.tag)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({"thunk": thunk, "tag": args.tag, "result": result})
        ),
        OutputFormat::Text => match result {
            Some(hash) => println!("{} {} → {}", thunk, display_tag(&args.tag), hash.as_str().green()),
            None => println!("{} {} {}", thunk, display_tag(&args.tag), "not reduced".yellow()),
        },
    }
    Ok(())
}

fn display_tag(tag: &str) -> String {
    if tag.is_empty() {
        "(default)".dimmed().to_string()
    } else {
        format!("#{tag}")
    }
}

fn cmd_stat(config: &GatewayConfig, args: StatArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let hash = ContentHash::new(args.hash)?;
    let store = FsBlobStore::new(StoreLayout::new(&config.base_dir));
    if !store.exists(&hash)? {
        anyhow::bail!("blob {hash} is not in {}", config.base_dir.display());
    }
    let stat = store.stat(&hash)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({"hash": hash, "size": stat.size, "executable": stat.executable, "thunk": hash.is_thunk()})
        ),
        OutputFormat::Text => {
            let kind = if hash.is_thunk() { "thunk".cyan() } else { "value".normal() };
            let mode = if stat.executable { "executable".green() } else { "regular".normal() };
            println!("{}  {} bytes  {}  {}", hash.as_str().bold(), stat.size, kind, mode);
        }
    }
    Ok(())
}

fn cmd_config(config: &GatewayConfig, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", toml::to_string_pretty(config)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> GatewayConfig {
        GatewayConfig {
            base_dir: dir.to_path_buf(),
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn stat_reports_missing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        StoreLayout::new(dir.path()).ensure().unwrap();
        let err = cmd_stat(&config, StatArgs { hash: "B1".into() }, &OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("B1"));
    }

    #[test]
    fn lookup_and_stat_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let layout = StoreLayout::new(dir.path());
        layout.ensure().unwrap();
        std::fs::write(layout.reductions_dir().join("X1#out"), "B1").unwrap();
        FsBlobStore::new(layout)
            .put(&ContentHash::new("B1").unwrap(), b"hello")
            .unwrap();

        cmd_lookup(
            &config,
            LookupArgs { thunk: "X1".into(), tag: "out".into() },
            &OutputFormat::Json,
        )
        .unwrap();
        cmd_stat(&config, StatArgs { hash: "B1".into() }, &OutputFormat::Text).unwrap();
    }

    #[test]
    fn invalid_hash_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        assert!(cmd_stat(&config, StatArgs { hash: "../x".into() }, &OutputFormat::Text).is_err());
    }

    #[test]
    fn config_renders_as_toml() {
        let config = GatewayConfig::default();
        cmd_config(&config, &OutputFormat::Text).unwrap();
    }
}
