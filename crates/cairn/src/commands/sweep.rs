//! Sweep command - drop expired and corrupt entries.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde_json::json;

use super::{Context, print_header};

/// Arguments for the sweep command.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Namespace to sweep
    pub namespace: String,
}

/// Run the sweep command.
pub async fn run(args: SweepArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store(&args.namespace);
    let report = store.sweep().await?;

    if ctx.json_output {
        let output = json!({
            "namespace": store.namespace(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_header(&format!("Sweep of '{}'", store.namespace()));
    println!("  Scanned:  {}", style(report.scanned).cyan());
    println!("  Expired:  {}", style(report.expired).cyan());
    println!("  Corrupt:  {}", style(report.corrupt).cyan());
    if report.stale_temp > 0 {
        println!("  Temp:     {}", style(report.stale_temp).cyan());
    }
    if report.failed > 0 {
        println!(
            "  Failed:   {}",
            Style::new().red().apply_to(report.failed)
        );
    }
    println!();

    Ok(())
}
