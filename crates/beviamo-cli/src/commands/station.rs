use beviamo_core::models::search_stations;

use crate::commands::common::normalize_content;
use crate::error::CliError;

pub fn run_station(query: &str) -> Result<(), CliError> {
    let Some(query) = normalize_content(query) else {
        return Err(beviamo_core::Error::InvalidInput("Search query cannot be empty".to_string()).into());
    };

    let matches = search_stations(&query);
    if matches.is_empty() {
        println!("No stations match '{query}'.");
        return Ok(());
    }

    for station in matches {
        println!("{:<7}  {:<28}  {:<12}  {}", station.id, station.nome, station.comune, station.indirizzo);
    }
    Ok(())
}
