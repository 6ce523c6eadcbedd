//! Execution history records.

use crate::property::{Direction, PropertyHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One successful execution of an algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub name: String,
    pub version: u32,
    pub execution_date: DateTime<Utc>,
    pub duration: Duration,
    pub success: bool,
    /// Property snapshot in declaration order.
    pub properties: Vec<PropertyHistory>,
    /// Child algorithms executed during this run, in completion order.
    pub children: Vec<HistoryRecord>,
}

impl HistoryRecord {
    pub fn property(&self, name: &str) -> Option<&PropertyHistory> {
        self.properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Call-like rendering of the non-default inputs, e.g.
    /// `Scale(InputWorkspace='raw', Factor='2')`.
    pub fn to_call_string(&self) -> String {
        let args: Vec<String> = self
            .properties
            .iter()
            .filter(|p| !p.is_default && p.direction != Direction::Output)
            .map(|p| format!("{}='{}'", p.name, p.value.replace('\'', "\\'")))
            .collect();
        format!("{}({})", self.name, args.join(", "))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> HistoryRecord {
        HistoryRecord {
            name: "Scale".to_string(),
            version: 1,
            execution_date: Utc::now(),
            duration: Duration::from_millis(12),
            success: true,
            properties: vec![
                PropertyHistory {
                    name: "InputWorkspace".to_string(),
                    value: "raw".to_string(),
                    is_default: false,
                    direction: Direction::Input,
                },
                PropertyHistory {
                    name: "Factor".to_string(),
                    value: "1".to_string(),
                    is_default: true,
                    direction: Direction::Input,
                },
                PropertyHistory {
                    name: "Result".to_string(),
                    value: "2".to_string(),
                    is_default: false,
                    direction: Direction::Output,
                },
            ],
            children: Vec::new(),
        }
    }

    #[test]
    fn test_call_string_lists_non_default_inputs() {
        assert_eq!(record().to_call_string(), "Scale(InputWorkspace='raw')");
    }

    #[test]
    fn test_json_round_trip() {
        let original = record();
        let parsed = HistoryRecord::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.property("factor").unwrap().value, "1");
    }
}
