//! Registry subcommand handler.

use tracing::info;

use taskbridge_core::Dispatcher;
use taskbridge_protocols::RegistryEntry;

use crate::cli::OutputFormat;

/// Print the resolved service registry.
pub(crate) async fn show_registry(
    dispatcher: &Dispatcher,
    format: OutputFormat,
    refresh: bool,
) -> anyhow::Result<()> {
    let registry = dispatcher.registry();
    if refresh {
        let changed = dispatcher.refresh_registry().await?;
        info!(changed, "Registry refreshed");
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&registry.snapshot())?);
        }
        OutputFormat::Table => {
            let entries = registry.entries();
            if entries.is_empty() {
                println!("No services registered.");
                return Ok(());
            }
            print!("{}", render_table(&entries));
            if registry.is_explicit() {
                println!("\n(explicit registry, discovery disabled)");
            }
        }
    }
    Ok(())
}

fn render_table(entries: &[RegistryEntry]) -> String {
    let mut out = format!(
        "{:<14} {:<24} {:<22} {:<11} {}\n",
        "TYPE", "NAME", "PROTOCOL", "SOURCE", "ENDPOINT"
    );
    out.push_str(&format!("{}\n", "-".repeat(96)));
    for entry in entries {
        out.push_str(&format!(
            "{:<14} {:<24} {:<22} {:<11} {}\n",
            entry.service_type,
            entry.name,
            format!("{:?}", entry.protocol),
            format!("{:?}", entry.source),
            entry.endpoint
        ));
    }
    out
}
