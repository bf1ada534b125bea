//! Stats command - namespace statistics.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde_json::json;

use cairn_session::WELL_KNOWN_NAMESPACES;

use super::{Context, format_duration, print_header};

/// Arguments for the stats command.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Namespaces to report on (default: conversation, brainstorm, review)
    pub namespaces: Vec<String>,
}

/// Run the stats command.
pub async fn run(args: StatsArgs, ctx: &Context) -> Result<()> {
    let namespaces = if args.namespaces.is_empty() {
        WELL_KNOWN_NAMESPACES.iter().map(|s| s.to_string()).collect()
    } else {
        args.namespaces
    };

    let mut all = Vec::with_capacity(namespaces.len());
    for namespace in &namespaces {
        all.push(ctx.store(namespace).stats().await?);
    }

    if ctx.json_output {
        let output: Vec<_> = all
            .iter()
            .map(|s| {
                json!({
                    "namespace": s.namespace,
                    "live_count": s.live_count,
                    "total_entries": s.total_entries,
                    "ttl_secs": s.ttl.as_secs(),
                    "max_entries": s.max_entries,
                    "eviction_policy": s.eviction_policy,
                    "storage_location": s.storage_location,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    print_header("Session Cache Statistics");

    for stats in &all {
        println!("{}", style(&stats.namespace).bold());
        println!(
            "  Live:      {} / {}",
            style(stats.live_count).cyan(),
            stats.max_entries
        );
        if stats.total_entries != stats.live_count {
            println!(
                "  On disk:   {}",
                dim.apply_to(format!(
                    "{} ({} awaiting sweep)",
                    stats.total_entries,
                    stats.total_entries.saturating_sub(stats.live_count)
                ))
            );
        }
        println!("  TTL:       {}", format_duration(stats.ttl));
        println!("  Eviction:  {}", stats.eviction_policy);
        println!(
            "  Location:  {}",
            dim.apply_to(stats.storage_location.display())
        );
        println!();
    }

    Ok(())
}
