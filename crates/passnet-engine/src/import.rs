use passnet_core::current_unix_timestamp_millis;
use passnet_parse::{ParsedMatch, parse_match_events};
use passnet_store::GraphStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ImportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub match_id: String,
    pub teams_imported: usize,
    pub passes_imported: usize,
}

/// Imports one raw event log: validates the identifier, extracts pass
/// records and teams, then materializes the match graph.
///
/// Parsing runs before any write, so a malformed payload never leaves the
/// substrate touched. `now_ms` overrides the import timestamp for callers
/// that need determinism; `None` stamps the current time.
pub fn import_events<S: GraphStore>(
    store: &S,
    match_id: &str,
    events: &Value,
    now_ms: Option<i64>,
) -> Result<ImportSummary, ImportError> {
    let match_id = required_match_id(match_id)?;
    let parsed = parse_match_events(events)?;
    materialize(store, match_id, &parsed, now_ms)
}

/// Materializes parsed pass records as the match's derived graph,
/// replacing whatever the identifier previously held.
///
/// The replace is a single substrate transaction: on failure the remaining
/// steps never run and no partial import is reported as success. Re-running
/// with identical records yields identical aggregation results. Concurrent
/// imports targeting the same identifier are a race the caller must
/// serialize; this layer takes no per-identifier lock.
pub fn materialize<S: GraphStore>(
    store: &S,
    match_id: &str,
    parsed: &ParsedMatch,
    now_ms: Option<i64>,
) -> Result<ImportSummary, ImportError> {
    let imported_at = now_ms.unwrap_or_else(current_unix_timestamp_millis);

    store.replace_match(match_id, imported_at, &parsed.teams, &parsed.passes)?;

    tracing::info!(
        match_id,
        teams = parsed.teams.len(),
        passes = parsed.passes.len(),
        "imported match graph"
    );

    Ok(ImportSummary {
        match_id: match_id.to_owned(),
        teams_imported: parsed.teams.len(),
        passes_imported: parsed.passes.len(),
    })
}

fn required_match_id(match_id: &str) -> Result<&str, ImportError> {
    let trimmed = match_id.trim();
    if trimmed.is_empty() {
        return Err(ImportError::EmptyMatchId);
    }
    Ok(trimmed)
}
