use passnet_core::{MinuteWindow, PassEvent, PassFilter, PlayerId, TeamId, TeamRef};
use thiserror::Error;

mod sqlite;

pub use sqlite::SqliteGraphStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One aggregated (source, destination) pair of the passing network, with
/// the number of qualifying passes between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkLinkRow {
    pub from_id: PlayerId,
    pub from_name: String,
    pub to_id: PlayerId,
    pub to_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRow {
    pub player_id: PlayerId,
    pub name: String,
}

/// Per-player positional aggregate. Averages are computed only over passes
/// with both start coordinates present and stay `None` when no such pass
/// exists; `passes_made` counts every qualifying pass regardless.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRow {
    pub player_id: PlayerId,
    pub name: String,
    pub avg_x: Option<f64>,
    pub avg_y: Option<f64>,
    pub passes_made: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasserRow {
    pub player_id: PlayerId,
    pub name: String,
    pub attempts: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRow {
    pub match_id: String,
    pub imported_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    pub team_id: TeamId,
    pub name: String,
}

/// Persistence-substrate boundary: a property graph reached through
/// parametrized declarative operations, each executing as one transactional
/// unit and returning typed rows.
pub trait GraphStore {
    /// Connectivity probe; cheap enough to run at startup.
    fn ping(&self) -> Result<(), StoreError>;

    /// Full replace of one match's derived graph inside a single
    /// transaction: drops the match's pass edges and "involves" links,
    /// recreates the match node, merges teams and players keyed by id (names
    /// set only on creation), and creates one pass edge per record. Team and
    /// player nodes are never deleted.
    fn replace_match(
        &self,
        match_id: &str,
        imported_at_ms: i64,
        teams: &[TeamRef],
        passes: &[PassEvent],
    ) -> Result<(), StoreError>;

    /// Qualifying passes grouped by (source, destination), ordered by count
    /// descending. Secondary order among equal counts is unspecified.
    fn network_links(
        &self,
        match_id: &str,
        filter: &PassFilter,
    ) -> Result<Vec<NetworkLinkRow>, StoreError>;

    /// Distinct players appearing as source or destination of a pass in the
    /// match (optionally restricted to one team), ordered by name.
    fn match_players(
        &self,
        match_id: &str,
        team_id: Option<TeamId>,
    ) -> Result<Vec<PlayerRow>, StoreError>;

    /// Positional aggregates per source player, ordered by pass count
    /// descending. Secondary order among equal counts is unspecified.
    fn average_positions(
        &self,
        match_id: &str,
        window: &MinuteWindow,
        team_id: Option<TeamId>,
    ) -> Result<Vec<PositionRow>, StoreError>;

    /// Attempt/completion counts per source player for one team, ordered by
    /// attempts descending, truncated to `limit`.
    fn top_passers(
        &self,
        match_id: &str,
        team_id: TeamId,
        window: &MinuteWindow,
        limit: i64,
    ) -> Result<Vec<PasserRow>, StoreError>;

    /// All imported matches, newest import first.
    fn list_matches(&self) -> Result<Vec<MatchRow>, StoreError>;

    /// Teams linked to the match via its "involves" relation, ordered by
    /// name.
    fn match_teams(&self, match_id: &str) -> Result<Vec<TeamRow>, StoreError>;
}
