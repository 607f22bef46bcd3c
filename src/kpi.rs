// KPI shape normalizer.
//
// Upstream sends either an `Indicateurs` array (already canonical, only the
// numbers need coercing) or a `Cards` array whose items embed a `History`
// blob. Both end up as the same `Indicator` list; anything else yields an
// empty list.

use crate::types::{Indicator, KpiReport};
use crate::util::{parse_date_safe, to_bool, to_number, to_text};
use chrono::Datelike;
use serde_json::{Map, Value};

/// The two payload shapes we know about, plus everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum KpiPayload {
    Indicateurs(Vec<Value>),
    Cards(Vec<Value>),
    Unsupported,
}

impl KpiPayload {
    /// `Indicateurs` is checked before `Cards`.
    pub fn classify(payload: &Value) -> KpiPayload {
        let Some(obj) = payload.as_object() else {
            return KpiPayload::Unsupported;
        };
        if let Some(Value::Array(items)) = obj.get("Indicateurs") {
            return KpiPayload::Indicateurs(items.clone());
        }
        if let Some(Value::Array(cards)) = obj.get("Cards") {
            return KpiPayload::Cards(cards.clone());
        }
        KpiPayload::Unsupported
    }
}

/// Normalize any JSON value into the canonical indicator list. Never fails.
pub fn normalize_kpi(payload: &Value) -> KpiReport {
    let indicateurs = match KpiPayload::classify(payload) {
        KpiPayload::Indicateurs(items) => items.iter().map(coerce_indicator).collect(),
        KpiPayload::Cards(cards) => cards.iter().map(card_to_indicator).collect(),
        KpiPayload::Unsupported => Vec::new(),
    };
    KpiReport { indicateurs }
}

static NULL: Value = Value::Null;

fn field<'a>(obj: Option<&'a Map<String, Value>>, name: &str) -> &'a Value {
    obj.and_then(|o| o.get(name)).unwrap_or(&NULL)
}

fn first_text(obj: Option<&Map<String, Value>>, names: &[&str]) -> String {
    names
        .iter()
        .map(|n| to_text(field(obj, n)))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn unit(obj: Option<&Map<String, Value>>) -> Option<String> {
    Some(to_text(field(obj, "Unit"))).filter(|s| !s.is_empty())
}

fn coerce_indicator(item: &Value) -> Indicator {
    let obj = item.as_object();
    Indicator {
        indicateur: to_text(field(obj, "Indicateur")),
        valeur_semaine: to_number(field(obj, "Valeur_Semaine")),
        target: to_number(field(obj, "Target")),
        semaine_m1: to_number(field(obj, "Semaine_M1")),
        semaine_m2: to_number(field(obj, "Semaine_M2")),
        semaine_m3: to_number(field(obj, "Semaine_M3")),
        semaine_m4: to_number(field(obj, "Semaine_M4")),
        lower_is_better: to_bool(field(obj, "LowerIsBetter")),
        unit: unit(obj),
    }
}

fn card_to_indicator(card: &Value) -> Indicator {
    let obj = card.as_object();
    let history = parse_history(field(obj, "History"));
    // idx 0 is the current week, idx n is n weeks back.
    let back = |idx: usize| -> f64 {
        if idx < history.len() {
            history[history.len() - 1 - idx]
        } else {
            0.0
        }
    };
    Indicator {
        indicateur: first_text(obj, &["Indicateur", "Title", "Name", "Label"]),
        valeur_semaine: back(0),
        target: to_number(field(obj, "Target")),
        semaine_m1: back(1),
        semaine_m2: back(2),
        semaine_m3: back(3),
        semaine_m4: back(4),
        lower_is_better: to_bool(field(obj, "LowerIsBetter")),
        unit: unit(obj),
    }
}

type HistoryKey = (i32, u32, u32);

/// Decode a `History` blob (JSON string or array) into chronological values.
pub fn parse_history(raw: &Value) -> Vec<f64> {
    let decoded;
    let entries = match raw {
        Value::Array(items) => items,
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s).unwrap_or(Value::Null);
            match &decoded {
                Value::Array(items) => items,
                _ => return Vec::new(),
            }
        }
        _ => return Vec::new(),
    };

    let mut points: Vec<(Option<HistoryKey>, f64)> =
        entries.iter().map(|e| (history_key(e), history_value(e))).collect();
    // Only reorder when every point can be placed on the calendar.
    if points.iter().all(|(k, _)| k.is_some()) {
        points.sort_by_key(|(k, _)| *k);
    }
    points.into_iter().map(|(_, v)| v).collect()
}

fn history_value(entry: &Value) -> f64 {
    match entry.as_object() {
        Some(obj) => ["Valeur", "Value", "value"]
            .iter()
            .find_map(|k| obj.get(*k))
            .map(to_number)
            .unwrap_or(0.0),
        None => to_number(entry),
    }
}

fn history_key(entry: &Value) -> Option<HistoryKey> {
    let obj = entry.as_object()?;
    if let Some(date) = parse_date_safe(obj.get("Date").and_then(Value::as_str)) {
        let iso = date.iso_week();
        return Some((iso.year(), iso.week(), date.weekday().num_days_from_monday()));
    }
    let week = obj.get("Semaine")?;
    let year = obj.get("Annee").map(to_number).unwrap_or(0.0);
    Some((year as i32, to_number(week).max(0.0) as u32, 0))
}
