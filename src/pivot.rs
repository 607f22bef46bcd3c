// Pivot engine: flat dated cost records -> zone / cell type / month / week rollup.
//
// Every zone's grid is aligned on one global column set (`weeksPerMonth`),
// so a zone without data for some week still gets a zero cell there.

use crate::error::{Result, RollupError};
use crate::months::{is_known_month, month_group, same_month, sort_months};
use crate::types::{
    CellAggregate, CellType, MonthAggregate, PivotScope, Record, WeekIndex, WeekValue,
    ZoneAggregate, ZoneType,
};
use log::warn;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Pivot every zone, in input order.
pub fn pivot(zones: &[ZoneType]) -> Vec<ZoneAggregate> {
    if zones.is_empty() {
        return Vec::new();
    }
    let index = build_week_index(zones);
    zones.iter().map(|z| aggregate_zone(z, &index)).collect()
}

/// Narrow every zone to `scope` first, then pivot.
///
/// The week index is built from the filtered records only.
pub fn pivot_scoped(zones: &[ZoneType], scope: &PivotScope) -> Vec<ZoneAggregate> {
    let filtered: Vec<ZoneType> = zones
        .iter()
        .map(|z| ZoneType {
            zone: z.zone.clone(),
            details: z
                .details
                .iter()
                .filter(|r| in_scope(r, scope))
                .cloned()
                .collect(),
        })
        .collect();
    pivot(&filtered)
}

/// Pivot a raw JSON payload: either a `ZoneType[]` array or an object
/// carrying a `zonesType` array.
pub fn pivot_json(payload: &Value) -> Result<Vec<ZoneAggregate>> {
    let zones = zones_from_json(payload)?;
    Ok(pivot(&zones))
}

pub fn zones_from_json(payload: &Value) -> Result<Vec<ZoneType>> {
    let list = match payload {
        Value::Array(_) => payload,
        Value::Object(map) => match map.get("zonesType") {
            Some(inner @ Value::Array(_)) => inner,
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(_) => {
                return Err(RollupError::Contract(
                    "`zonesType` must be an array".to_string(),
                ))
            }
        },
        _ => {
            return Err(RollupError::Contract(
                "pivot input must be an array or an object".to_string(),
            ))
        }
    };
    Ok(serde_json::from_value(list.clone())?)
}

fn in_scope(r: &Record, scope: &PivotScope) -> bool {
    if let Some(year) = scope.annee {
        if r.annee != year {
            return false;
        }
    }
    match &scope.mois {
        Some(m) => same_month(&r.mois, m),
        None => true,
    }
}

/// Distinct months across every record, in calendar order, each with the
/// sorted set of weeks seen for it anywhere in the input.
pub fn build_week_index(zones: &[ZoneType]) -> WeekIndex {
    // Display name is the first spelling seen for each month group.
    let mut months: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut weeks: HashMap<String, BTreeSet<i32>> = HashMap::new();

    for r in zones.iter().flat_map(|z| z.details.iter()) {
        let group = month_group(&r.mois);
        if seen.insert(group.clone()) {
            months.push(r.mois.clone());
            if !is_known_month(&r.mois) {
                warn!("unknown month name {:?}, sorting it after décembre", r.mois);
            }
        }
        weeks.entry(group).or_default().insert(r.semaine);
    }

    sort_months(&mut months);
    let entries = months
        .into_iter()
        .map(|m| {
            let w = weeks
                .get(&month_group(&m))
                .map(|s| s.iter().copied().collect())
                .unwrap_or_default();
            (m, w)
        })
        .collect();
    WeekIndex::new(entries)
}

fn aggregate_zone(zone: &ZoneType, index: &WeekIndex) -> ZoneAggregate {
    // First match wins for both the weekly value and the explicit month total.
    let mut values: HashMap<(CellType, String, i32), f64> = HashMap::new();
    let mut totals: HashMap<(CellType, String), f64> = HashMap::new();
    for r in &zone.details {
        let Some(ct) = CellType::parse(&r.type_cell) else {
            continue;
        };
        let group = month_group(&r.mois);
        if let Some(t) = r.total_mois {
            totals.entry((ct, group.clone())).or_insert(t);
        }
        values.entry((ct, group, r.semaine)).or_insert(r.couts);
    }

    let cells: Vec<CellAggregate> = CellType::ALL
        .iter()
        .map(|&ct| CellAggregate {
            name: ct,
            months: index
                .iter()
                .map(|(month, weeks)| {
                    let group = month_group(month);
                    let weeks: Vec<WeekValue> = weeks
                        .iter()
                        .map(|&w| WeekValue {
                            week_num: w,
                            value: values.get(&(ct, group.clone(), w)).copied().unwrap_or(0.0),
                        })
                        .collect();
                    let total = match totals.get(&(ct, group)) {
                        Some(t) => *t,
                        None => weeks.iter().map(|w| w.value).sum(),
                    };
                    MonthAggregate {
                        name: month.to_string(),
                        weeks,
                        total,
                    }
                })
                .collect(),
        })
        .collect();

    ZoneAggregate {
        key: zone.zone.clone(),
        totals: grand_totals(&cells, index.len()),
        cells,
        weeks_per_month: index.clone(),
    }
}

fn grand_totals(cells: &[CellAggregate], month_count: usize) -> Vec<Vec<f64>> {
    (0..month_count)
        .map(|mi| {
            let months: Vec<&MonthAggregate> = cells.iter().map(|c| &c.months[mi]).collect();
            let width = months.first().map(|m| m.weeks.len()).unwrap_or(0);
            let mut row: Vec<f64> = (0..width)
                .map(|wi| months.iter().map(|m| m.weeks[wi].value).sum())
                .collect();
            row.push(months.iter().map(|m| m.total).sum());
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(tc: &str, week: i32, mois: &str, couts: f64, total: Option<f64>) -> Record {
        Record {
            zone: None,
            type_cell: tc.to_string(),
            semaine: week,
            mois: mois.to_string(),
            annee: 2024,
            couts,
            total_mois: total,
        }
    }

    fn zone(name: &str, details: Vec<Record>) -> ZoneType {
        ZoneType {
            zone: name.to_string(),
            details,
        }
    }

    #[test]
    fn single_record_scenario() {
        let out = pivot(&[zone("A", vec![rec("Projet", 1, "janvier", 10.0, Some(10.0))])]);
        assert_eq!(out.len(), 1);
        let a = &out[0];
        assert_eq!(a.key, "A");
        assert_eq!(a.cells.len(), 2);

        let projet = &a.cells[0];
        assert_eq!(projet.name, CellType::Projet);
        assert_eq!(projet.months[0].name, "janvier");
        assert_eq!(projet.months[0].weeks, vec![WeekValue { week_num: 1, value: 10.0 }]);
        assert_eq!(projet.months[0].total, 10.0);

        let serie = &a.cells[1];
        assert_eq!(serie.name, CellType::Serie);
        assert_eq!(serie.months[0].weeks, vec![WeekValue { week_num: 1, value: 0.0 }]);
        assert_eq!(serie.months[0].total, 0.0);

        assert_eq!(a.totals, vec![vec![10.0, 10.0]]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(pivot(&[]).is_empty());
    }

    #[test]
    fn zone_without_records_still_gets_columns() {
        let out = pivot(&[
            zone("A", vec![rec("Serie", 5, "février", 3.0, Some(7.0)), rec("Serie", 6, "février", 4.0, Some(7.0))]),
            zone("B", vec![]),
        ]);
        let b = &out[1];
        for cell in &b.cells {
            let weeks: Vec<i32> = cell.months[0].weeks.iter().map(|w| w.week_num).collect();
            assert_eq!(weeks, vec![5, 6]);
            assert!(cell.months[0].weeks.iter().all(|w| w.value == 0.0));
            assert_eq!(cell.months[0].total, 0.0);
        }
        assert_eq!(b.totals, vec![vec![0.0, 0.0, 0.0]]);
    }

    #[test]
    fn month_total_is_taken_verbatim_not_summed() {
        let out = pivot(&[zone(
            "A",
            vec![
                rec("Projet", 1, "mars", 2.0, Some(100.0)),
                rec("Projet", 2, "mars", 3.0, Some(100.0)),
            ],
        )]);
        assert_eq!(out[0].cells[0].months[0].total, 100.0);
        assert_eq!(out[0].totals[0], vec![2.0, 3.0, 100.0]);
    }

    #[test]
    fn missing_total_falls_back_to_week_sum() {
        let out = pivot(&[zone(
            "A",
            vec![rec("Projet", 1, "mars", 2.0, None), rec("Projet", 2, "mars", 3.0, None)],
        )]);
        assert_eq!(out[0].cells[0].months[0].total, 5.0);
    }

    #[test]
    fn first_explicit_total_wins() {
        let out = pivot(&[zone(
            "A",
            vec![
                rec("Projet", 1, "mars", 2.0, None),
                rec("Projet", 2, "mars", 3.0, Some(40.0)),
                rec("Projet", 3, "mars", 3.0, Some(41.0)),
            ],
        )]);
        assert_eq!(out[0].cells[0].months[0].total, 40.0);
    }

    #[test]
    fn duplicate_week_rows_keep_the_first() {
        let out = pivot(&[zone(
            "A",
            vec![rec("Projet", 1, "mars", 2.0, None), rec("Projet", 1, "mars", 9.0, None)],
        )]);
        assert_eq!(out[0].cells[0].months[0].weeks[0].value, 2.0);
    }

    #[test]
    fn week_index_is_global_and_calendar_ordered() {
        let zones = vec![
            zone("A", vec![rec("Projet", 14, "avril", 1.0, None), rec("Projet", 2, "janvier", 1.0, None)]),
            zone("B", vec![rec("Serie", 1, "janvier", 1.0, None), rec("Serie", 2, "janvier", 1.0, None)]),
        ];
        let index = build_week_index(&zones);
        let months: Vec<&str> = index.months().collect();
        assert_eq!(months, vec!["janvier", "avril"]);
        assert_eq!(index.weeks("janvier"), &[1, 2]);
        assert_eq!(index.weeks("avril"), &[14]);
        assert_eq!(index.weeks("mai"), &[] as &[i32]);
    }

    #[test]
    fn unknown_month_is_kept_and_sorted_last() {
        let out = pivot(&[zone(
            "A",
            vec![rec("Projet", 1, "Q1", 1.0, None), rec("Projet", 9, "mars", 2.0, None)],
        )]);
        let names: Vec<&str> = out[0].cells[0].months.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["mars", "Q1"]);
    }

    #[test]
    fn month_spellings_fold_into_first_seen() {
        let out = pivot(&[
            zone(
                "A",
                vec![
                    rec("Projet", 10, "mars", 1.0, None),
                    rec("Projet", 11, "Mars", 2.0, None),
                    rec("Serie", 12, " mars", 3.0, Some(30.0)),
                ],
            ),
            zone("B", vec![rec("Projet", 10, "MARS ", 4.0, Some(4.0))]),
        ]);
        let a = &out[0];
        let months: Vec<&str> = a.weeks_per_month.months().collect();
        assert_eq!(months, vec!["mars"]);
        assert_eq!(a.weeks_per_month.weeks("Mars"), &[10, 11, 12]);

        let projet = &a.cells[0].months;
        assert_eq!(projet.len(), 1);
        assert_eq!(projet[0].name, "mars");
        let values: Vec<f64> = projet[0].weeks.iter().map(|w| w.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 0.0]);
        assert_eq!(projet[0].total, 3.0);
        assert_eq!(a.cells[1].months[0].total, 30.0);
        assert_eq!(a.totals, vec![vec![1.0, 2.0, 3.0, 33.0]]);

        assert_eq!(out[1].cells[0].months[0].weeks[0].value, 4.0);
        assert_eq!(out[1].cells[0].months[0].total, 4.0);
    }

    #[test]
    fn unknown_month_spellings_fold_too() {
        let out = pivot(&[zone(
            "A",
            vec![rec("Projet", 1, "Q1", 1.0, None), rec("Projet", 2, " q1", 2.0, None)],
        )]);
        let months: Vec<&str> = out[0].weeks_per_month.months().collect();
        assert_eq!(months, vec!["Q1"]);
        assert_eq!(out[0].cells[0].months[0].total, 3.0);
    }

    #[test]
    fn unknown_cell_types_are_ignored_but_shape_columns() {
        let out = pivot(&[zone("A", vec![rec("Autre", 3, "mai", 8.0, Some(8.0))])]);
        assert_eq!(out[0].cells.len(), 2);
        for cell in &out[0].cells {
            assert_eq!(cell.months[0].weeks, vec![WeekValue { week_num: 3, value: 0.0 }]);
        }
    }

    #[test]
    fn scope_filters_before_indexing() {
        let mut old = rec("Projet", 50, "décembre", 5.0, None);
        old.annee = 2023;
        let zones = vec![zone("A", vec![old, rec("Projet", 1, "janvier", 1.0, None), rec("Projet", 6, "février", 1.0, None)])];

        let by_year = pivot_scoped(&zones, &PivotScope { annee: Some(2024), mois: None });
        let months: Vec<&str> = by_year[0].weeks_per_month.months().collect();
        assert_eq!(months, vec!["janvier", "février"]);

        let by_month = pivot_scoped(
            &zones,
            &PivotScope { annee: Some(2024), mois: Some("Février".to_string()) },
        );
        let months: Vec<&str> = by_month[0].weeks_per_month.months().collect();
        assert_eq!(months, vec!["février"]);
    }

    #[test]
    fn json_entry_accepts_array_or_wrapper() {
        let rows = json!([{ "zone": "A", "details": [
            { "typeCell": "Projet", "semaine": "1", "mois": "janvier", "annee": 2024, "couts": "10", "total_mois": 10 }
        ]}]);
        let direct = pivot_json(&rows).unwrap();
        let wrapped = pivot_json(&json!({ "zonesType": rows })).unwrap();
        assert_eq!(direct, wrapped);
        assert_eq!(direct[0].cells[0].months[0].weeks[0].value, 10.0);

        assert!(pivot_json(&json!({})).unwrap().is_empty());
        assert!(matches!(pivot_json(&json!(42)), Err(RollupError::Contract(_))));
        assert!(matches!(pivot_json(&json!("x")), Err(RollupError::Contract(_))));
    }

    #[test]
    fn serializes_with_api_field_names() {
        let out = pivot(&[zone("A", vec![rec("Projet", 1, "janvier", 10.0, Some(10.0))])]);
        let v = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(v["cells"][0]["name"], json!("Projet"));
        assert_eq!(v["cells"][0]["months"][0]["weeks"][0], json!({ "weekNum": 1, "value": 10.0 }));
        assert_eq!(v["weeksPerMonth"], json!({ "janvier": [1] }));
    }
}
