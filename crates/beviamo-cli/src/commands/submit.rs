use std::path::Path;

use beviamo_core::store::LocalStore;

use crate::cli_config::CliConfig;
use crate::commands::common::{open_engine, short_id};
use crate::error::CliError;

pub async fn run_submit(config: &CliConfig, data_path: &Path) -> Result<(), CliError> {
    let engine = open_engine(data_path, config)?;
    let draft = engine.store().load_draft();
    let submission = engine.submit_draft(draft).await?;

    let id = short_id(submission.submitted.id.as_str());
    let settings = engine.settings();

    if !submission.report.success {
        let reason = submission.report.error.unwrap_or_default();
        eprintln!("Intervention {id} saved locally; the draft is kept so you can retry.");
        return Err(CliError::SyncFailed(reason));
    }

    if settings.is_remote_enabled() {
        println!(
            "Submitted {id} to workspace '{}' ({} new from the team)",
            settings.workspace_key, submission.report.added
        );
    } else {
        println!("Submitted {id} (saved locally; no workspace key set)");
    }
    Ok(())
}
