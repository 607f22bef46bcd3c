// Canonical calendar order for the French month names used as grouping keys.
//
// Records spell months loosely ("Mars", " mars"), so every grouping goes
// through `month_group`; the first spelling seen is what gets displayed.

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// The twelve month names, in calendar order.
pub const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Rank given to any name outside the table: after every known month.
pub const UNKNOWN_RANK: usize = MONTHS.len();

static RANKS: Lazy<HashMap<&'static str, usize>> =
    Lazy::new(|| MONTHS.iter().enumerate().map(|(i, m)| (*m, i)).collect());

/// Position of `name` in the calendar, matched after trimming and lower-casing.
pub fn month_index(name: &str) -> Option<usize> {
    let key = name.trim().to_lowercase();
    RANKS.get(key.as_str()).copied()
}

pub fn month_rank(name: &str) -> usize {
    month_index(name).unwrap_or(UNKNOWN_RANK)
}

pub fn is_known_month(name: &str) -> bool {
    month_index(name).is_some()
}

/// Grouping key: the table spelling for known months, otherwise the
/// trimmed, lower-cased text.
pub fn month_group(name: &str) -> String {
    match month_index(name) {
        Some(i) => MONTHS[i].to_string(),
        None => name.trim().to_lowercase(),
    }
}

pub fn same_month(a: &str, b: &str) -> bool {
    month_group(a) == month_group(b)
}

/// Stable sort by calendar rank. Unknown names keep their relative order.
pub fn sort_months(names: &mut [String]) {
    names.sort_by_key(|m| month_rank(m));
}

/// A month name usable as an ordered map key.
///
/// Equality, hashing and ordering all go through [`month_group`], so
/// `"Mars"` and `" mars"` are the same key. Ordering follows the calendar;
/// unknown names sort last, between themselves by text.
#[derive(Debug, Clone)]
pub struct MonthKey {
    name: String,
    group: String,
}

impl MonthKey {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let group = month_group(&name);
        MonthKey { name, group }
    }

    /// The spelling this key was created with.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl PartialEq for MonthKey {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group
    }
}

impl Eq for MonthKey {}

impl Hash for MonthKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.group.hash(state);
    }
}

impl Ord for MonthKey {
    fn cmp(&self, other: &Self) -> Ordering {
        month_rank(&self.group)
            .cmp(&month_rank(&other.group))
            .then_with(|| self.group.cmp(&other.group))
    }
}

impl PartialOrd for MonthKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        String::deserialize(d).map(MonthKey::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_padding() {
        assert_eq!(month_index("janvier"), Some(0));
        assert_eq!(month_index(" Décembre "), Some(11));
        assert_eq!(month_index("AOÛT"), Some(7));
        assert_eq!(month_index("january"), None);
    }

    #[test]
    fn sort_is_calendar_not_lexical() {
        let mut names: Vec<String> = ["mars", "janvier", "décembre", "avril", "février"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_months(&mut names);
        assert_eq!(names, vec!["janvier", "février", "mars", "avril", "décembre"]);
    }

    #[test]
    fn unknown_months_sort_last_in_seen_order() {
        let mut names: Vec<String> = ["zzz", "mai", "Q1", "janvier"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_months(&mut names);
        assert_eq!(names, vec!["janvier", "mai", "zzz", "Q1"]);
    }

    #[test]
    fn month_key_orders_by_calendar() {
        let mut keys = vec![
            MonthKey::new("octobre"),
            MonthKey::new("???"),
            MonthKey::new("février"),
        ];
        keys.sort();
        let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["février", "octobre", "???"]);
    }

    #[test]
    fn same_month_matches_known_names_loosely() {
        assert!(same_month("Mars", "mars"));
        assert!(!same_month("mars", "avril"));
        assert!(same_month("T1", "T1"));
        assert!(same_month(" t1", "T1 "));
    }

    #[test]
    fn group_folds_case_and_padding() {
        assert_eq!(month_group(" MARS "), "mars");
        assert_eq!(month_group("Août"), "août");
        assert_eq!(month_group(" Q1 "), "q1");
    }

    #[test]
    fn month_key_equality_ignores_spelling() {
        use std::collections::{BTreeMap, HashSet};

        assert_eq!(MonthKey::new("mars"), MonthKey::new(" Mars"));
        assert_ne!(MonthKey::new("mars"), MonthKey::new("avril"));

        let set: HashSet<MonthKey> = ["mars", "MARS", " mars "].iter().map(|m| MonthKey::new(*m)).collect();
        assert_eq!(set.len(), 1);

        let mut map = BTreeMap::new();
        map.entry(MonthKey::new("Mars")).or_insert(1);
        *map.entry(MonthKey::new("mars ")).or_insert(0) += 1;
        assert_eq!(map.len(), 1);
        assert_eq!(map.keys().next().unwrap().as_str(), "Mars");
        assert_eq!(map[&MonthKey::new("mars")], 2);
    }
}
