use crate::error::Result;
use crate::types::{
    IndicatorRow, KpiReport, OverlayRow, PivotCsvRow, ZoneAggregate, ZoneDetail,
};
use crate::util::format_number;
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// One CSV row per (zone, type, month, week), plus a `total` row per month.
pub fn flatten_pivot(zones: &[ZoneAggregate]) -> Vec<PivotCsvRow> {
    let mut rows = Vec::new();
    for z in zones {
        for cell in &z.cells {
            for month in &cell.months {
                for w in &month.weeks {
                    rows.push(PivotCsvRow {
                        zone: z.key.clone(),
                        cell_type: cell.name.to_string(),
                        month: month.name.clone(),
                        week: w.week_num.to_string(),
                        value: w.value,
                    });
                }
                rows.push(PivotCsvRow {
                    zone: z.key.clone(),
                    cell_type: cell.name.to_string(),
                    month: month.name.clone(),
                    week: "total".to_string(),
                    value: month.total,
                });
            }
        }
    }
    rows
}

/// Render one zone as a grid: a header of `S<week>` columns grouped by month,
/// one row per cell type and a trailing grand-total row.
pub fn render_zone_grid(zone: &ZoneAggregate, decimals: usize) -> String {
    let mut header = vec!["Type".to_string()];
    for (month, weeks) in zone.weeks_per_month.iter() {
        header.extend(weeks.iter().map(|w| format!("{} S{}", month, w)));
        header.push(format!("{} total", month));
    }

    let mut builder = Builder::default();
    builder.push_record(header);
    for cell in &zone.cells {
        let mut row = vec![cell.name.to_string()];
        for month in &cell.months {
            row.extend(month.weeks.iter().map(|w| format_number(w.value, decimals)));
            row.push(format_number(month.total, decimals));
        }
        builder.push_record(row);
    }
    let mut total_row = vec!["Total".to_string()];
    for month_totals in &zone.totals {
        total_row.extend(month_totals.iter().map(|v| format_number(*v, decimals)));
    }
    builder.push_record(total_row);

    builder.build().with(Style::markdown()).to_string()
}

pub fn overlay_rows(detail: &ZoneDetail, decimals: usize) -> Vec<OverlayRow> {
    let mut rows = Vec::new();
    for (cellule, cell) in &detail.cells {
        for (mois, m) in &cell.months {
            let weeks = m
                .weeks
                .iter()
                .map(|(w, v)| format!("S{}={}", w, format_number(*v, decimals)))
                .collect::<Vec<_>>()
                .join(" ");
            rows.push(OverlayRow {
                cellule: cellule.clone(),
                cell_type: cell.cell_type.clone(),
                mois: mois.as_str().to_string(),
                weeks,
                total: format_number(m.total, decimals),
            });
        }
    }
    rows
}

pub fn indicator_rows(report: &KpiReport, decimals: usize) -> Vec<IndicatorRow> {
    report
        .indicateurs
        .iter()
        .map(|i| {
            let fmt = |v: f64| match &i.unit {
                Some(u) => format!("{} {}", format_number(v, decimals), u),
                None => format_number(v, decimals),
            };
            let on_target = if i.lower_is_better {
                i.valeur_semaine <= i.target
            } else {
                i.valeur_semaine >= i.target
            };
            IndicatorRow {
                indicateur: i.indicateur.clone(),
                valeur: fmt(i.valeur_semaine),
                target: fmt(i.target),
                m1: fmt(i.semaine_m1),
                m2: fmt(i.semaine_m2),
                m3: fmt(i.semaine_m3),
                m4: fmt(i.semaine_m4),
                status: if on_target { "OK".to_string() } else { "Off target".to_string() },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::pivot;
    use crate::types::{Indicator, Record, ZoneType};

    fn sample() -> Vec<ZoneAggregate> {
        pivot(&[ZoneType {
            zone: "A".to_string(),
            details: vec![Record {
                zone: None,
                type_cell: "Projet".to_string(),
                semaine: 1,
                mois: "janvier".to_string(),
                annee: 2024,
                couts: 10.0,
                total_mois: Some(10.0),
            }],
        }])
    }

    #[test]
    fn flatten_emits_weeks_and_totals_for_both_types() {
        let rows = flatten_pivot(&sample());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].cell_type, "Projet");
        assert_eq!(rows[0].week, "1");
        assert_eq!(rows[1].week, "total");
        assert_eq!(rows[3].cell_type, "Serie");
        assert_eq!(rows[3].value, 0.0);
    }

    #[test]
    fn grid_has_month_headers_and_total_row() {
        let grid = render_zone_grid(&sample()[0], 0);
        assert!(grid.contains("janvier S1"));
        assert!(grid.contains("janvier total"));
        assert!(grid.contains("Serie"));
        assert!(grid.contains("Total"));
    }

    #[test]
    fn indicator_status_respects_direction() {
        let report = KpiReport {
            indicateurs: vec![
                Indicator { indicateur: "Scrap".into(), valeur_semaine: 2.0, target: 3.0, lower_is_better: true, ..Default::default() },
                Indicator { indicateur: "OEE".into(), valeur_semaine: 60.0, target: 85.0, unit: Some("%".into()), ..Default::default() },
            ],
        };
        let rows = indicator_rows(&report, 1);
        assert_eq!(rows[0].status, "OK");
        assert_eq!(rows[1].status, "Off target");
        assert_eq!(rows[1].valeur, "60,0 %");
    }

    #[test]
    fn write_csv_and_json_roundtrip_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("pivot.csv");
        write_csv(&csv_path, &flatten_pivot(&sample())).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("Zone,Type,Month,Week,Value"));

        let json_path = dir.path().join("pivot.json");
        write_json(&json_path, &sample()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(v[0]["key"], "A");
    }
}
