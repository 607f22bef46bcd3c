// Drill-down merger: zone-scoped detail rows -> cell / month / week overlay.
//
// Duplicate (cell, month, week) rows overwrite each other in input order;
// nothing is summed or averaged. Month spellings fold through `MonthKey`.

use crate::error::{Result, RollupError};
use crate::months::MonthKey;
use crate::types::{CellDetail, DetailOverlay, DetailRecord, MonthDetail, ZoneDetail};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Either a list of detail rows or a lone row.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DetailInput {
    Many(Vec<DetailRecord>),
    One(DetailRecord),
}

impl DetailInput {
    pub fn into_records(self) -> Vec<DetailRecord> {
        match self {
            DetailInput::Many(v) => v,
            DetailInput::One(r) => vec![r],
        }
    }
}

/// Group rows by their own `zone` field (empty when missing).
pub fn merge_detail(records: &[DetailRecord]) -> DetailOverlay {
    let mut by_zone: BTreeMap<String, Vec<&DetailRecord>> = BTreeMap::new();
    for r in records {
        let zone = r.zone.clone().unwrap_or_default();
        by_zone.entry(zone).or_default().push(r);
    }
    DetailOverlay(
        by_zone
            .into_iter()
            .map(|(zone, rows)| (zone, build_zone(rows)))
            .collect(),
    )
}

/// Merge rows fetched for `zone`, whatever their own `zone` field says.
pub fn merge_zone_detail(zone: &str, records: &[DetailRecord]) -> DetailOverlay {
    let mut overlay = BTreeMap::new();
    overlay.insert(zone.to_string(), build_zone(records.iter()));
    DetailOverlay(overlay)
}

/// Decode a raw payload (array or single object) and merge it.
pub fn merge_detail_json(payload: &Value) -> Result<DetailOverlay> {
    Ok(merge_detail(&records_from_json(payload)?))
}

pub fn records_from_json(payload: &Value) -> Result<Vec<DetailRecord>> {
    match payload {
        Value::Array(_) | Value::Object(_) => {
            let input: DetailInput = serde_json::from_value(payload.clone())?;
            Ok(input.into_records())
        }
        _ => Err(RollupError::Contract(
            "detail input must be an array or an object".to_string(),
        )),
    }
}

#[derive(Default)]
struct MonthAcc {
    weeks: BTreeMap<i32, f64>,
    total: Option<f64>,
}

#[derive(Default)]
struct CellAcc {
    cell_type: String,
    months: BTreeMap<MonthKey, MonthAcc>,
}

fn build_zone<'a>(rows: impl IntoIterator<Item = &'a DetailRecord>) -> ZoneDetail {
    let mut cells: BTreeMap<String, CellAcc> = BTreeMap::new();
    for r in rows {
        let cell = cells.entry(r.cellule.clone()).or_default();
        // A row without `typeCell` does not blank a type already known.
        if !r.type_cell.trim().is_empty() {
            cell.cell_type = r.type_cell.clone();
        }
        let month = cell.months.entry(MonthKey::new(r.mois.clone())).or_default();
        month.weeks.insert(r.semaine, r.couts);
        if r.total_mois.is_some() {
            month.total = r.total_mois;
        }
    }

    ZoneDetail {
        cells: cells
            .into_iter()
            .map(|(name, acc)| {
                let months = acc
                    .months
                    .into_iter()
                    .map(|(key, m)| {
                        let total = m.total.unwrap_or_else(|| m.weeks.values().sum());
                        (key, MonthDetail { weeks: m.weeks, total })
                    })
                    .collect();
                (
                    name,
                    CellDetail {
                        cell_type: acc.cell_type,
                        months,
                    },
                )
            })
            .collect(),
    }
}
