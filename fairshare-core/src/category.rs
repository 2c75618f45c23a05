//! Household task taxonomy.
//!
//! Labels coming from storage are free text (English or French, with or
//! without accents). Parsing is total: anything unrecognized is `Other`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed category taxonomy for household tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskCategory {
    Education,
    Health,
    Administrative,
    Daily,
    Social,
    Activities,
    Logistics,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 8] = [
        TaskCategory::Education,
        TaskCategory::Health,
        TaskCategory::Administrative,
        TaskCategory::Daily,
        TaskCategory::Social,
        TaskCategory::Activities,
        TaskCategory::Logistics,
        TaskCategory::Other,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Education => "education",
            TaskCategory::Health => "health",
            TaskCategory::Administrative => "administrative",
            TaskCategory::Daily => "daily",
            TaskCategory::Social => "social",
            TaskCategory::Activities => "activities",
            TaskCategory::Logistics => "logistics",
            TaskCategory::Other => "other",
        }
    }

    /// Parse a free-text label. Never fails.
    pub fn from_label(label: &str) -> Self {
        let folded = fold(label);
        match folded.as_str() {
            "education" | "ecole" | "school" | "scolaire" | "devoirs" => TaskCategory::Education,
            "health" | "sante" | "medical" | "medecin" => TaskCategory::Health,
            "administrative" | "administratif" | "admin" | "paperwork" | "papiers" => {
                TaskCategory::Administrative
            }
            "daily" | "quotidien" | "chores" | "menage" | "household" => TaskCategory::Daily,
            "social" | "famille" | "family" => TaskCategory::Social,
            "activities" | "activites" | "activity" | "loisirs" | "sport" => {
                TaskCategory::Activities
            }
            "logistics" | "logistique" | "transport" | "courses" | "errands" => {
                TaskCategory::Logistics
            }
            _ => TaskCategory::Other,
        }
    }
}

/// Lowercase, trim and strip the accents found in French labels.
fn fold(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TaskCategory {
    fn from(label: &str) -> Self {
        TaskCategory::from_label(label)
    }
}

impl From<String> for TaskCategory {
    fn from(label: String) -> Self {
        TaskCategory::from_label(&label)
    }
}

impl From<TaskCategory> for String {
    fn from(category: TaskCategory) -> Self {
        category.as_str().to_string()
    }
}
