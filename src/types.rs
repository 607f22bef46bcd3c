use crate::months::{same_month, MonthKey};
use crate::util::{de_int, de_number, de_opt_number, de_opt_text, de_text};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

/// One dated cost row, as delivered by the reporting API.
///
/// The source is denormalized: every week row of a month repeats the same
/// `total_mois`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(rename = "typeCell", default, deserialize_with = "de_text")]
    pub type_cell: String,
    #[serde(default, deserialize_with = "de_int")]
    pub semaine: i32,
    #[serde(default, deserialize_with = "de_text")]
    pub mois: String,
    #[serde(default, deserialize_with = "de_int")]
    pub annee: i32,
    #[serde(default, deserialize_with = "de_number")]
    pub couts: f64,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub total_mois: Option<f64>,
}

/// Records of one zone, grouped at the API boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneType {
    #[serde(default, deserialize_with = "de_text")]
    pub zone: String,
    #[serde(default)]
    pub details: Vec<Record>,
}

/// Cost classification. The pivot always emits both, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Projet,
    Serie,
}

impl CellType {
    pub const ALL: [CellType; 2] = [CellType::Projet, CellType::Serie];

    pub fn label(self) -> &'static str {
        match self {
            CellType::Projet => "Projet",
            CellType::Serie => "Serie",
        }
    }

    /// Match a raw `typeCell` label. Anything unrecognized is `None`.
    pub fn parse(raw: &str) -> Option<CellType> {
        match raw.trim().to_lowercase().as_str() {
            "projet" => Some(CellType::Projet),
            "serie" | "série" => Some(CellType::Serie),
            _ => None,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Optional narrowing applied before pivoting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotScope {
    #[serde(default)]
    pub annee: Option<i32>,
    #[serde(default)]
    pub mois: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekValue {
    #[serde(rename = "weekNum")]
    pub week_num: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthAggregate {
    pub name: String,
    pub weeks: Vec<WeekValue>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellAggregate {
    pub name: CellType,
    pub months: Vec<MonthAggregate>,
}

/// Month → sorted distinct weeks, in canonical month order.
///
/// Lookups by month name are case- and padding-insensitive.
///
/// Serialized as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekIndex {
    entries: Vec<(String, Vec<i32>)>,
}

impl WeekIndex {
    pub fn new(entries: Vec<(String, Vec<i32>)>) -> Self {
        WeekIndex { entries }
    }

    pub fn months(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(m, _)| m.as_str())
    }

    pub fn weeks(&self, month: &str) -> &[i32] {
        self.entries
            .iter()
            .find(|(m, _)| same_month(m, month))
            .map(|(_, w)| w.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[i32])> {
        self.entries.iter().map(|(m, w)| (m.as_str(), w.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for WeekIndex {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.entries.len()))?;
        for (month, weeks) in &self.entries {
            map.serialize_entry(month, weeks)?;
        }
        map.end()
    }
}

/// Nested rollup for one zone: type → month → week, plus grand totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneAggregate {
    pub key: String,
    pub cells: Vec<CellAggregate>,
    /// `totals[month][week]`, with a trailing column holding the month total.
    pub totals: Vec<Vec<f64>>,
    #[serde(rename = "weeksPerMonth")]
    pub weeks_per_month: WeekIndex,
}

/// One row of a zone-scoped drill-down fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub cellule: String,
    #[serde(rename = "typeCell", default, deserialize_with = "de_text")]
    pub type_cell: String,
    #[serde(default, deserialize_with = "de_text")]
    pub mois: String,
    #[serde(default, deserialize_with = "de_int")]
    pub semaine: i32,
    #[serde(default, deserialize_with = "de_number")]
    pub couts: f64,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub total_mois: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthDetail {
    pub weeks: BTreeMap<i32, f64>,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellDetail {
    #[serde(rename = "type")]
    pub cell_type: String,
    pub months: BTreeMap<MonthKey, MonthDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneDetail {
    pub cells: BTreeMap<String, CellDetail>,
}

/// Zone name → per-cell drill-down, overlaid on the summary rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DetailOverlay(pub BTreeMap<String, ZoneDetail>);

impl DetailOverlay {
    pub fn zone(&self, name: &str) -> Option<&ZoneDetail> {
        self.0.get(name)
    }

    pub fn into_zone(mut self, name: &str) -> Option<ZoneDetail> {
        self.0.remove(name)
    }
}

/// Canonical dashboard indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Indicator {
    #[serde(rename = "Indicateur")]
    pub indicateur: String,
    #[serde(rename = "Valeur_Semaine")]
    pub valeur_semaine: f64,
    #[serde(rename = "Target")]
    pub target: f64,
    #[serde(rename = "Semaine_M1")]
    pub semaine_m1: f64,
    #[serde(rename = "Semaine_M2")]
    pub semaine_m2: f64,
    #[serde(rename = "Semaine_M3")]
    pub semaine_m3: f64,
    #[serde(rename = "Semaine_M4")]
    pub semaine_m4: f64,
    #[serde(rename = "LowerIsBetter")]
    pub lower_is_better: bool,
    #[serde(rename = "Unit", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiReport {
    #[serde(rename = "Indicateurs")]
    pub indicateurs: Vec<Indicator>,
}

// Flat rows for CSV export and console previews.

#[derive(Debug, Serialize, Clone)]
pub struct PivotCsvRow {
    #[serde(rename = "Zone")]
    pub zone: String,
    #[serde(rename = "Type")]
    pub cell_type: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Week")]
    pub week: String,
    #[serde(rename = "Value")]
    pub value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct IndicatorRow {
    #[tabled(rename = "Indicateur")]
    pub indicateur: String,
    #[tabled(rename = "Semaine")]
    pub valeur: String,
    #[tabled(rename = "Target")]
    pub target: String,
    #[tabled(rename = "S-1")]
    pub m1: String,
    #[tabled(rename = "S-2")]
    pub m2: String,
    #[tabled(rename = "S-3")]
    pub m3: String,
    #[tabled(rename = "S-4")]
    pub m4: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OverlayRow {
    #[tabled(rename = "Cellule")]
    pub cellule: String,
    #[tabled(rename = "Type")]
    pub cell_type: String,
    #[tabled(rename = "Mois")]
    pub mois: String,
    #[tabled(rename = "Semaines")]
    pub weeks: String,
    #[tabled(rename = "Total")]
    pub total: String,
}
