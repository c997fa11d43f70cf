//! Safety checklist for routine maintenance

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Checklist state: item id → checked, plus optional notes per item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    #[serde(default)]
    pub checks: BTreeMap<String, bool>,
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
}

impl Checklist {
    #[must_use]
    pub fn is_checked(&self, item_id: &str) -> bool {
        self.checks.get(item_id).copied().unwrap_or(false)
    }

    pub(crate) fn toggle(&mut self, item_id: &str) -> bool {
        let value = !self.is_checked(item_id);
        self.checks.insert(item_id.to_string(), value);
        value
    }

    /// Empty notes remove the entry.
    pub(crate) fn set_note(&mut self, item_id: &str, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            self.notes.remove(item_id);
        } else {
            self.notes.insert(item_id.to_string(), note.to_string());
        }
    }

    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.checks.values().filter(|checked| **checked).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistSection {
    pub title: &'static str,
    pub items: &'static [ChecklistItem],
}

const fn item(id: &'static str, label: &'static str) -> ChecklistItem {
    ChecklistItem { id, label }
}

pub const CHECKLIST_SECTIONS: &[ChecklistSection] = &[
    ChecklistSection {
        title: "Sicurezza e Pre-Intervento",
        items: &[
            item("sec1_dpi", "DPI indossati"),
            item("sec1_area", "Area in sicurezza"),
            item("sec1_ele", "Alimentazione disatt."),
            item("sec1_press", "Pressione scaricata"),
            item("sec1_leak", "Assenza perdite pre"),
        ],
    },
    ChecklistSection {
        title: "Struttura e Involucro",
        items: &[
            item("sec2_state", "Stato generale"),
            item("sec2_clean", "Pulizia int/est"),
            item("sec2_seal", "Guarnizioni porte"),
            item("sec2_cond", "Assenza condensa"),
            item("sec2_vent", "Griglie/Filtri aria"),
        ],
    },
    ChecklistSection {
        title: "Impianto Idraulico",
        items: &[
            item("sec3_pipe", "Controllo tubazioni"),
            item("sec3_joint", "Verifica raccordi"),
            item("sec3_work_press", "Pressione esercizio"),
            item("sec3_valve", "Elettrovalvole"),
            item("sec3_reg", "Riduttore press."),
        ],
    },
];

/// Look up a checklist item by id
#[must_use]
pub fn checklist_item(item_id: &str) -> Option<&'static ChecklistItem> {
    CHECKLIST_SECTIONS
        .iter()
        .flat_map(|section| section.items.iter())
        .find(|item| item.id == item_id)
}

#[must_use]
pub fn is_known_checklist_item(item_id: &str) -> bool {
    checklist_item(item_id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_fifteen_unique_items() {
        let mut ids = CHECKLIST_SECTIONS
            .iter()
            .flat_map(|section| section.items.iter().map(|item| item.id))
            .collect::<Vec<_>>();
        assert_eq!(ids.len(), 15);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 15);
    }

    #[test]
    fn test_checklist_item_lookup() {
        assert_eq!(checklist_item("sec2_seal").unwrap().label, "Guarnizioni porte");
        assert!(checklist_item("sec4_x").is_none());
    }

    #[test]
    fn test_toggle_and_notes() {
        let mut checklist = Checklist::default();
        assert!(checklist.toggle("sec1_dpi"));
        assert_eq!(checklist.checked_count(), 1);
        assert!(!checklist.toggle("sec1_dpi"));
        assert_eq!(checklist.checked_count(), 0);

        checklist.set_note("sec1_dpi", "  guanti nuovi ");
        assert_eq!(checklist.notes["sec1_dpi"], "guanti nuovi");
        checklist.set_note("sec1_dpi", " ");
        assert!(checklist.notes.is_empty());
    }

    #[test]
    fn test_missing_maps_decode_as_empty() {
        let checklist: Checklist = serde_json::from_str("{}").unwrap();
        assert_eq!(checklist, Checklist::default());
    }
}
