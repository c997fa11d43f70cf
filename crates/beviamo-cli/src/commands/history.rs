use std::path::Path;

use beviamo_core::store::LocalStore;

use crate::commands::common::{
    filter_history, format_history_lines, history_to_list_item, open_store, HistoryListItem,
};
use crate::error::CliError;

pub fn run_history(
    station: Option<&str>,
    limit: usize,
    as_json: bool,
    data_path: &Path,
) -> Result<(), CliError> {
    let history = filter_history(open_store(data_path)?.load_history(), station, limit);

    if as_json {
        let json_items = history
            .iter()
            .map(history_to_list_item)
            .collect::<Vec<HistoryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No interventions recorded.");
        return Ok(());
    }

    for line in format_history_lines(&history) {
        println!("{line}");
    }
    Ok(())
}
