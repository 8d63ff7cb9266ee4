//! Dispatch and metrics subcommand handlers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use taskbridge_core::Dispatcher;
use taskbridge_protocols::EngineTask;

/// Read an engine task from a JSON file. Engine-typed variables are
/// flattened to plain values.
pub(crate) fn read_task(path: &Path) -> anyhow::Result<EngineTask> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read task file {}", path.display()))?;
    let task: EngineTask = serde_json::from_str(&content)
        .with_context(|| format!("Invalid task JSON in {}", path.display()))?;
    Ok(task.unwrap_typed_variables())
}

/// Dispatch one task file and print the backend result.
///
/// On failure the structured error report is printed instead.
pub(crate) async fn dispatch_file(
    dispatcher: &Dispatcher,
    path: &Path,
    print_metrics: bool,
) -> anyhow::Result<()> {
    let task = read_task(path)?;
    let outcome = dispatcher.dispatch(&task).await;

    match &outcome {
        Ok(result) => println!("{}", serde_json::to_string_pretty(result)?),
        Err(e) => println!("{}", serde_json::to_string_pretty(&e.report())?),
    }
    if print_metrics {
        println!(
            "{}",
            serde_json::to_string_pretty(&dispatcher.metrics_snapshot().to_json())?
        );
    }

    outcome
        .map(|_| ())
        .with_context(|| format!("Dispatch of {} failed", path.display()))
}

/// Dispatch every task file, then print the metrics snapshot. Individual
/// failures are reported and do not stop the run.
pub(crate) async fn dispatch_and_report(
    dispatcher: &Dispatcher,
    paths: &[PathBuf],
) -> anyhow::Result<()> {
    let mut failed = 0;
    for path in paths {
        let task = read_task(path)?;
        if let Err(e) = dispatcher.dispatch(&task).await {
            failed += 1;
            info!(task = %path.display(), error = %e, "Task failed");
        }
    }
    if failed > 0 {
        info!(failed, total = paths.len(), "Some tasks failed");
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&dispatcher.metrics_snapshot().to_json())?
    );
    Ok(())
}
