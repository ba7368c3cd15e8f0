use std::collections::HashSet;

use passnet_core::{
    DEFAULT_TOP_PASSERS_LIMIT, MinuteWindow, PassFilter, PlayerId, TeamId,
};
use passnet_store::GraphStore;
use serde::{Deserialize, Serialize};

use crate::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NetworkParams {
    pub window: MinuteWindow,
    pub team_id: Option<TeamId>,
    pub successful_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionsParams {
    pub window: MinuteWindow,
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TopPassersParams {
    pub window: MinuteWindow,
    pub team_id: Option<TeamId>,
    /// `None` or a negative value falls back to the default of 10; zero is
    /// honored and yields an empty result.
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLink {
    pub source: PlayerId,
    pub target: PlayerId,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkResult {
    pub nodes: Vec<NetworkNode>,
    pub links: Vec<NetworkLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPlayer {
    pub player_id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterResult {
    pub players: Vec<RosterPlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub avg_x: Option<f64>,
    pub avg_y: Option<f64>,
    pub passes_made: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionsResult {
    pub positions: Vec<PositionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPasser {
    pub player_id: PlayerId,
    pub name: String,
    pub attempts: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPassersResult {
    pub players: Vec<TopPasser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: String,
    pub imported_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchesResult {
    pub matches: Vec<MatchSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntry {
    pub team_id: TeamId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamsResult {
    pub teams: Vec<TeamEntry>,
}

/// Passing network for one match: qualifying edges grouped per (source,
/// destination) pair, weight descending, plus the distinct node set the
/// emitted links reference, in first-appearance order. Among equal weights
/// the secondary order is unspecified.
pub fn network<S: GraphStore>(
    store: &S,
    match_id: &str,
    params: &NetworkParams,
) -> Result<NetworkResult, QueryError> {
    let match_id = required_match_id(match_id)?;
    let filter = PassFilter {
        window: params.window,
        team_id: params.team_id,
        successful_only: params.successful_only,
    };

    let rows = store.network_links(match_id, &filter)?;

    let mut nodes = Vec::new();
    let mut seen = HashSet::new();
    for row in &rows {
        if seen.insert(row.from_id) {
            nodes.push(NetworkNode {
                id: row.from_id,
                name: row.from_name.clone(),
            });
        }
        if seen.insert(row.to_id) {
            nodes.push(NetworkNode {
                id: row.to_id,
                name: row.to_name.clone(),
            });
        }
    }

    let links = rows
        .into_iter()
        .map(|row| NetworkLink {
            source: row.from_id,
            target: row.to_id,
            count: row.count,
        })
        .collect();

    Ok(NetworkResult { nodes, links })
}

/// Distinct players appearing on either end of a pass in the match,
/// optionally restricted to one team, sorted by name ascending.
pub fn roster<S: GraphStore>(
    store: &S,
    match_id: &str,
    team_id: Option<TeamId>,
) -> Result<RosterResult, QueryError> {
    let match_id = required_match_id(match_id)?;
    let rows = store.match_players(match_id, team_id)?;

    Ok(RosterResult {
        players: rows
            .into_iter()
            .map(|row| RosterPlayer {
                player_id: row.player_id,
                name: row.name,
            })
            .collect(),
    })
}

/// Average start position and pass count per source player. Players whose
/// qualifying passes all lack coordinates keep null averages; the count
/// always reflects every qualifying pass.
pub fn positions<S: GraphStore>(
    store: &S,
    match_id: &str,
    params: &PositionsParams,
) -> Result<PositionsResult, QueryError> {
    let match_id = required_match_id(match_id)?;
    let rows = store.average_positions(match_id, &params.window, params.team_id)?;

    Ok(PositionsResult {
        positions: rows
            .into_iter()
            .map(|row| PositionEntry {
                player_id: row.player_id,
                name: row.name,
                avg_x: row.avg_x,
                avg_y: row.avg_y,
                passes_made: row.passes_made,
            })
            .collect(),
    })
}

/// Attempt/completion ranking for one team, attempts descending. The team
/// id is required; its absence is a client fault raised before the
/// substrate is queried.
pub fn top_passers<S: GraphStore>(
    store: &S,
    match_id: &str,
    params: &TopPassersParams,
) -> Result<TopPassersResult, QueryError> {
    let match_id = required_match_id(match_id)?;
    let team_id = params.team_id.ok_or(QueryError::MissingTeamId)?;
    let limit = normalize_limit(params.limit);

    let rows = store.top_passers(match_id, team_id, &params.window, limit)?;

    Ok(TopPassersResult {
        players: rows
            .into_iter()
            .map(|row| TopPasser {
                player_id: row.player_id,
                name: row.name,
                attempts: row.attempts,
                completed: row.completed,
            })
            .collect(),
    })
}

/// All imported matches, newest import first.
pub fn matches<S: GraphStore>(store: &S) -> Result<MatchesResult, QueryError> {
    let rows = store.list_matches()?;

    Ok(MatchesResult {
        matches: rows
            .into_iter()
            .map(|row| MatchSummary {
                match_id: row.match_id,
                imported_at: row.imported_at,
            })
            .collect(),
    })
}

/// Teams involved in the match, sorted by name.
pub fn teams<S: GraphStore>(store: &S, match_id: &str) -> Result<TeamsResult, QueryError> {
    let match_id = required_match_id(match_id)?;
    let rows = store.match_teams(match_id)?;

    Ok(TeamsResult {
        teams: rows
            .into_iter()
            .map(|row| TeamEntry {
                team_id: row.team_id,
                name: row.name,
            })
            .collect(),
    })
}

fn required_match_id(match_id: &str) -> Result<&str, QueryError> {
    let trimmed = match_id.trim();
    if trimmed.is_empty() {
        return Err(QueryError::EmptyMatchId);
    }
    Ok(trimmed)
}

fn normalize_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(value) if value >= 0 => value,
        _ => DEFAULT_TOP_PASSERS_LIMIT,
    }
}
