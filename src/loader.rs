use crate::error::Result;
use crate::pivot::zones_from_json;
use crate::types::{Record, ZoneType};
use csv::ReaderBuilder;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
    pub zones: usize,
}

/// Load pivot input from disk. `.csv` files hold flat records with a `zone`
/// column; anything else is read as the JSON `zonesType` payload.
pub fn load_zones(path: &Path) -> Result<(Vec<ZoneType>, LoadReport)> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        let (records, mut report) = load_csv_records(path)?;
        let zones = group_by_zone(records);
        report.zones = zones.len();
        return Ok((zones, report));
    }

    let zones = zones_from_json(&load_json(path)?)?;
    let report = LoadReport {
        total_rows: zones.iter().map(|z| z.details.len()).sum(),
        parse_errors: 0,
        zones: zones.len(),
    };
    Ok((zones, report))
}

pub fn load_csv_records(path: &Path) -> Result<(Vec<Record>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_path(path)?;
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut records = Vec::new();

    for result in rdr.deserialize::<Record>() {
        total_rows += 1;
        match result {
            Ok(r) => records.push(r),
            Err(_) => parse_errors += 1,
        }
    }

    let report = LoadReport { total_rows, parse_errors, zones: 0 };
    Ok((records, report))
}

/// Group flat records by zone, zones in first-seen order. Records without a
/// zone land in a zone named "".
pub fn group_by_zone(records: Vec<Record>) -> Vec<ZoneType> {
    let mut order: Vec<ZoneType> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    for r in records {
        let name = r.zone.clone().unwrap_or_default();
        let idx = *slot.entry(name.clone()).or_insert_with(|| {
            order.push(ZoneType { zone: name, details: Vec::new() });
            order.len() - 1
        });
        order[idx].details.push(r);
    }
    order
}

pub fn load_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
