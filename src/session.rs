// Expand/collapse state for zone drill-downs.
//
// Every expand issues a fresh `RequestToken`. A completion is applied only
// when its token is still the latest one for its zone; anything older is
// dropped. A failed fetch never touches the overlay already on screen.

use crate::detail::{merge_zone_detail, records_from_json};
use crate::error::{Result, RollupError};
use crate::types::ZoneDetail;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

/// Where zone detail payloads come from.
pub trait DetailSource {
    fn fetch_detail(&self, zone: &str) -> Result<Value>;
}

/// Reads `<dir>/<zone>.json`.
#[derive(Debug, Clone)]
pub struct FileDetailSource {
    dir: PathBuf,
}

impl FileDetailSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileDetailSource { dir: dir.into() }
    }
}

impl DetailSource for FileDetailSource {
    fn fetch_detail(&self, zone: &str) -> Result<Value> {
        let path = self.dir.join(format!("{}.json", zone));
        let text = fs::read_to_string(&path).map_err(|e| RollupError::Fetch {
            zone: zone.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    zone: String,
    seq: u64,
}

impl RequestToken {
    pub fn zone(&self) -> &str {
        &self.zone
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// The overlay was replaced; `cells` is the number of cells it holds.
    Applied { cells: usize },
    /// A newer request (or a collapse) superseded this one.
    Stale,
    /// The fetch or the payload failed; previous state kept.
    Failed,
}

#[derive(Debug, Default)]
pub struct DrilldownState {
    next_seq: u64,
    pending: HashMap<String, u64>,
    overlays: HashMap<String, ZoneDetail>,
    expanded: HashSet<String>,
}

impl DrilldownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an expand for `zone`, superseding any request still in flight.
    pub fn begin_expand(&mut self, zone: &str) -> RequestToken {
        self.next_seq += 1;
        self.pending.insert(zone.to_string(), self.next_seq);
        RequestToken {
            zone: zone.to_string(),
            seq: self.next_seq,
        }
    }

    /// Feed back the result of the fetch started by `token`.
    pub fn complete(&mut self, token: RequestToken, fetched: Result<Value>) -> ExpandOutcome {
        if self.pending.get(&token.zone) != Some(&token.seq) {
            debug!("dropping stale detail for zone {} (request {})", token.zone, token.seq);
            return ExpandOutcome::Stale;
        }
        self.pending.remove(&token.zone);

        let records = match fetched.and_then(|payload| records_from_json(&payload)) {
            Ok(records) => records,
            Err(e) => {
                warn!("detail fetch for zone {} failed: {}", token.zone, e);
                return ExpandOutcome::Failed;
            }
        };

        let detail = merge_zone_detail(&token.zone, &records)
            .into_zone(&token.zone)
            .unwrap_or_default();
        let cells = detail.cells.len();
        info!("zone {} expanded with {} cells", token.zone, cells);
        self.overlays.insert(token.zone.clone(), detail);
        self.expanded.insert(token.zone);
        ExpandOutcome::Applied { cells }
    }

    /// Fetch and apply in one go.
    pub fn expand(&mut self, zone: &str, source: &dyn DetailSource) -> ExpandOutcome {
        let token = self.begin_expand(zone);
        let fetched = source.fetch_detail(zone);
        self.complete(token, fetched)
    }

    /// Hide the overlay and cancel whatever is still in flight for `zone`.
    pub fn collapse(&mut self, zone: &str) {
        self.pending.remove(zone);
        self.expanded.remove(zone);
    }

    pub fn is_expanded(&self, zone: &str) -> bool {
        self.expanded.contains(zone)
    }

    /// The overlay to draw in place of the summary row, if the zone is open.
    pub fn overlay(&self, zone: &str) -> Option<&ZoneDetail> {
        if self.is_expanded(zone) {
            self.overlays.get(zone)
        } else {
            None
        }
    }
}
