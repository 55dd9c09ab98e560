// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Alert configuration rows as edited in the web UI
//!
//! A row looks like
//! `{"id": "a1", "key": "snr", "threshold": {"value": 12.5},
//!   "comp": {"item": "GT"}, "level": {"item": "Warning"}}`.

use crate::error::{ProxyError, Result};
use nms_thrift::schema::aggregator::{
    AggrAlertComparator, AggrAlertConf, AggrAlertConfList, AggrAlertLevel,
};
use serde::{Deserialize, Serialize};

const COMPARATORS: [(&str, AggrAlertComparator); 4] = [
    ("GT", AggrAlertComparator::Gt),
    ("GTE", AggrAlertComparator::Gte),
    ("LT", AggrAlertComparator::Lt),
    ("LTE", AggrAlertComparator::Lte),
];

const LEVELS: [(&str, AggrAlertLevel); 3] = [
    ("Info", AggrAlertLevel::Info),
    ("Warning", AggrAlertLevel::Warning),
    ("Critical", AggrAlertLevel::Critical),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRow {
    pub id: String,
    pub key: String,
    pub threshold: ThresholdCell,
    pub comp: ItemCell,
    pub level: ItemCell,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_mac: Option<String>,
}

/// Threshold editor cell; the UI sends numbers or numeric strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCell {
    pub value: serde_json::Value,
}

/// Drop-down editor cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCell {
    pub item: String,
}

impl ThresholdCell {
    fn as_f64(&self) -> Option<f64> {
        let value = match &self.value {
            serde_json::Value::Number(number) => number.as_f64(),
            serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|value| value.is_finite())
    }
}

impl TryFrom<&AlertRow> for AggrAlertConf {
    type Error = ProxyError;

    fn try_from(row: &AlertRow) -> Result<Self> {
        let threshold = row.threshold.as_f64().ok_or_else(|| {
            ProxyError::InvalidAlert(format!(
                "alert {:?}: threshold {} is not a number",
                row.id, row.threshold.value
            ))
        })?;
        let comp = lookup(&COMPARATORS, &row.comp.item).ok_or_else(|| {
            ProxyError::InvalidAlert(format!(
                "alert {:?}: unknown comparator {:?}",
                row.id, row.comp.item
            ))
        })?;
        let level = lookup(&LEVELS, &row.level.item).ok_or_else(|| {
            ProxyError::InvalidAlert(format!(
                "alert {:?}: unknown level {:?}",
                row.id, row.level.item
            ))
        })?;

        Ok(AggrAlertConf {
            id: row.id.clone(),
            key: row.key.clone(),
            threshold,
            comp,
            level,
            node_mac: row.node_mac.clone(),
        })
    }
}

impl From<&AggrAlertConf> for AlertRow {
    fn from(alert: &AggrAlertConf) -> Self {
        Self {
            id: alert.id.clone(),
            key: alert.key.clone(),
            threshold: ThresholdCell {
                value: serde_json::json!(alert.threshold),
            },
            comp: ItemCell {
                item: label(&COMPARATORS, alert.comp),
            },
            level: ItemCell {
                item: label(&LEVELS, alert.level),
            },
            node_mac: alert.node_mac.clone(),
        }
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], item: &str) -> Option<T> {
    table
        .iter()
        .find(|(name, _)| *name == item)
        .map(|(_, value)| *value)
}

fn label<T: Copy + PartialEq + Into<i32>>(table: &[(&str, T)], value: T) -> String {
    table
        .iter()
        .find(|(_, candidate)| *candidate == value)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| Into::<i32>::into(value).to_string())
}

/// Convert every row; the first bad row fails the whole list
pub fn alert_list_from_rows(rows: &[AlertRow]) -> Result<AggrAlertConfList> {
    let alerts = rows
        .iter()
        .map(AggrAlertConf::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok(AggrAlertConfList { alerts })
}

/// Parse the JSON array posted by the UI
pub fn parse_alert_rows(json: &str) -> Result<Vec<AlertRow>> {
    serde_json::from_str(json).map_err(|e| ProxyError::InvalidAlert(e.to_string()))
}

pub fn rows_from_alert_list(list: &AggrAlertConfList) -> Vec<AlertRow> {
    list.alerts.iter().map(AlertRow::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: &str = r#"[
        {"id": "a1", "key": "snr", "threshold": {"value": 12.5},
         "comp": {"item": "LTE"}, "level": {"item": "Critical"}, "_id": 0},
        {"id": "a2", "key": "mcs", "threshold": {"value": "3"},
         "comp": {"item": "GT"}, "level": {"item": "Info"}, "node_mac": "00:00:00:10:0d:40"}
    ]"#;

    #[test]
    fn test_rows_to_alert_list() {
        let list = alert_list_from_rows(&parse_alert_rows(ROWS).unwrap()).unwrap();
        assert_eq!(list.alerts.len(), 2);
        assert_eq!(list.alerts[0].comp, AggrAlertComparator::Lte);
        assert_eq!(list.alerts[0].level, AggrAlertLevel::Critical);
        assert_eq!(list.alerts[0].threshold, 12.5);
        assert_eq!(list.alerts[1].threshold, 3.0);
        assert_eq!(list.alerts[1].node_mac.as_deref(), Some("00:00:00:10:0d:40"));
    }

    #[test]
    fn test_bad_rows_rejected() {
        let rows = parse_alert_rows(
            r#"[{"id": "x", "key": "k", "threshold": {"value": null},
                 "comp": {"item": "GT"}, "level": {"item": "Info"}}]"#,
        )
        .unwrap();
        assert!(matches!(alert_list_from_rows(&rows), Err(ProxyError::InvalidAlert(_))));

        let mut rows = parse_alert_rows(ROWS).unwrap();
        rows[1].comp.item = "EQ".to_string();
        let error = alert_list_from_rows(&rows).unwrap_err().to_string();
        assert!(error.contains("EQ"));
    }

    #[test]
    fn test_alert_list_back_to_rows() {
        let list = alert_list_from_rows(&parse_alert_rows(ROWS).unwrap()).unwrap();
        let rows = rows_from_alert_list(&list);
        assert_eq!(rows[0].comp.item, "LTE");
        assert_eq!(rows[1].level.item, "Info");
        assert_eq!(alert_list_from_rows(&rows).unwrap(), list);
    }
}
