//! Show command - one session with its payload.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde_json::json;

use super::{Context, format_millis, print_header, rfc3339_millis};

/// Arguments for the show command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Namespace holding the session
    pub namespace: String,

    /// Session id
    pub session_id: String,
}

/// Run the show command.
///
/// This is a regular load: it refreshes recency in LRU namespaces and
/// removes the entry if it turns out to be expired or corrupt.
pub async fn run(args: ShowArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store(&args.namespace);

    let Some(record) = store.load(&args.session_id).await? else {
        if ctx.json_output {
            println!("null");
        } else {
            println!(
                "{}",
                Style::new().dim().apply_to(format!(
                    "No session '{}' in '{}'",
                    args.session_id,
                    store.namespace()
                ))
            );
        }
        return Ok(());
    };

    if ctx.json_output {
        let output = json!({
            "namespace": store.namespace(),
            "session_id": record.session_id,
            "created_at": rfc3339_millis(record.created_at),
            "last_accessed_at": rfc3339_millis(record.last_accessed_at),
            "payload": record.payload,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_header(&format!("Session '{}'", record.session_id));
    println!("  Namespace:      {}", style(store.namespace()).cyan());
    println!("  Created:        {}", format_millis(record.created_at));
    println!("  Last accessed:  {}", format_millis(record.last_accessed_at));
    if ctx.verbose {
        println!(
            "  File:           {}",
            store.path_for(&args.session_id).display()
        );
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&record.payload)?);

    Ok(())
}
