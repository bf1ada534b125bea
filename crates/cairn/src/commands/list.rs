//! List command - live sessions in a namespace.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde_json::json;

use super::{Context, format_millis, print_header, rfc3339_millis};

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Namespace to list
    pub namespace: String,
}

/// Run the list command.
pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store(&args.namespace);
    let records = store.list().await?;

    if ctx.json_output {
        let sessions: Vec<_> = records
            .iter()
            .map(|r| {
                json!({
                    "session_id": r.session_id,
                    "created_at": rfc3339_millis(r.created_at),
                    "last_accessed_at": rfc3339_millis(r.last_accessed_at),
                })
            })
            .collect();
        let output = json!({
            "namespace": store.namespace(),
            "sessions": sessions,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    print_header(&format!("Sessions in '{}'", store.namespace()));

    if records.is_empty() {
        println!("{}", dim.apply_to("No sessions"));
        return Ok(());
    }

    for record in &records {
        println!("  {}", style(&record.session_id).cyan());
        println!(
            "    {}",
            dim.apply_to(format!(
                "created {}  last accessed {}",
                format_millis(record.created_at),
                format_millis(record.last_accessed_at)
            ))
        );
    }
    println!();
    if ctx.verbose {
        println!("{}", dim.apply_to(format!("Location: {}", store.dir().display())));
    }

    Ok(())
}
