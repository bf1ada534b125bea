//! Delete command - remove one session.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde_json::json;

use super::Context;

/// Arguments for the delete command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Namespace holding the session
    pub namespace: String,

    /// Session id
    pub session_id: String,
}

/// Run the delete command.
pub async fn run(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store(&args.namespace);
    let deleted = store.delete(&args.session_id).await?;

    if ctx.json_output {
        let output = json!({
            "namespace": store.namespace(),
            "session_id": args.session_id,
            "deleted": deleted,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if deleted {
        println!(
            "{} {}",
            Style::new().green().apply_to("Deleted"),
            args.session_id
        );
    } else {
        println!(
            "{}",
            Style::new().dim().apply_to(format!(
                "Session '{}' not found in '{}'",
                args.session_id,
                store.namespace()
            ))
        );
    }

    Ok(())
}
