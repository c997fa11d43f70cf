//! Water station ("casetta") catalog

use serde::Serialize;

/// A water station the team maintains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Station {
    pub id: &'static str,
    pub nome: &'static str,
    pub comune: &'static str,
    pub indirizzo: &'static str,
}

impl Station {
    /// Display label stored on interventions, e.g. `CA-001 • Piazza Martiri (Biella)`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} • {} ({})", self.id, self.nome, self.comune)
    }

    fn matches(&self, needle: &str) -> bool {
        [self.id, self.nome, self.comune]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

pub const STATIONS: &[Station] = &[
    Station {
        id: "CA-001",
        nome: "Piazza Martiri",
        comune: "Biella",
        indirizzo: "Piazza Martiri della Libertà",
    },
    Station {
        id: "CA-002",
        nome: "Via Roma",
        comune: "Vercelli",
        indirizzo: "Via Roma, 42",
    },
    Station {
        id: "CA-003",
        nome: "Parco Europa",
        comune: "Novara",
        indirizzo: "Viale Kennedy",
    },
    Station {
        id: "CA-004",
        nome: "Fontana Blu",
        comune: "Aosta",
        indirizzo: "Piazza Chanoux",
    },
    Station {
        id: "CA-005",
        nome: "Eco Water 1",
        comune: "Torino",
        indirizzo: "Corso Francia, 120",
    },
    Station {
        id: "CA-006",
        nome: "Fonte Chiara",
        comune: "Ivrea",
        indirizzo: "Via Arduino",
    },
    Station {
        id: "CA-007",
        nome: "Acqua Nuova",
        comune: "Milano",
        indirizzo: "Via Dante",
    },
    Station {
        id: "CA-008",
        nome: "Sorgente Viva",
        comune: "Como",
        indirizzo: "Lungolago Mafalda di Savoia",
    },
];

/// Find a station by exact id (case-insensitive)
#[must_use]
pub fn find_station(id: &str) -> Option<&'static Station> {
    let id = id.trim();
    STATIONS
        .iter()
        .find(|station| station.id.eq_ignore_ascii_case(id))
}

/// Case-insensitive substring search over id, name and comune.
///
/// An empty query returns no results.
#[must_use]
pub fn search_stations(query: &str) -> Vec<&'static Station> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    STATIONS
        .iter()
        .filter(|station| station.matches(&needle))
        .collect()
}
