//! Config command - show loaded configuration.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde_json::json;

use cairn_session::WELL_KNOWN_NAMESPACES;

use super::{Context, format_duration, print_header};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Extra namespaces to resolve besides the well-known ones
    pub namespaces: Vec<String>,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let mut namespaces: Vec<String> = WELL_KNOWN_NAMESPACES.iter().map(|s| s.to_string()).collect();
    for namespace in args.namespaces {
        if !namespaces.contains(&namespace) {
            namespaces.push(namespace);
        }
    }
    let resolved: Vec<_> = namespaces
        .iter()
        .map(|ns| ctx.namespace_config(ns))
        .collect();

    if ctx.json_output {
        let sources: Vec<_> = ctx
            .loaded
            .sources
            .iter()
            .map(|s| json!({ "path": s.path, "loaded": s.loaded }))
            .collect();
        let namespaces: Vec<_> = resolved
            .iter()
            .map(|c| {
                json!({
                    "namespace": c.namespace,
                    "ttl_secs": c.ttl.as_secs(),
                    "max_entries": c.max_entries,
                    "eviction_policy": c.eviction_policy,
                })
            })
            .collect();
        let output = json!({
            "sources": sources,
            "warnings": ctx.loaded.warnings,
            "cache_dir": ctx.cache_root,
            "namespaces": namespaces,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    print_header("Cairn Configuration");

    let loaded_from = ctx.loaded.loaded_from();
    if loaded_from.is_empty() {
        println!("{}", dim.apply_to("No config files loaded (using defaults)"));
    } else {
        println!("Config files:");
        for path in &loaded_from {
            println!("  {}", path.display());
        }
    }
    if ctx.verbose {
        for source in ctx.loaded.sources.iter().filter(|s| !s.loaded) {
            println!("  {}", dim.apply_to(format!("{} (not found)", source.path.display())));
        }
    }
    println!();

    if !ctx.loaded.warnings.is_empty() {
        let yellow = Style::new().yellow();
        for warning in &ctx.loaded.warnings {
            println!("{} {}", yellow.apply_to("Warning:"), warning);
        }
        println!();
    }

    println!("Storage root: {}", style(ctx.cache_root.display()).cyan());
    println!();

    println!("{}", style("Namespaces").bold());
    for config in &resolved {
        println!(
            "  {:<14} ttl {:<6} max {:<4} {}",
            config.namespace,
            format_duration(config.ttl),
            config.max_entries,
            config.eviction_policy
        );
    }
    println!();

    Ok(())
}
