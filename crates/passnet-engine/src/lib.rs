use thiserror::Error;

mod import;
mod query;

pub use import::{ImportSummary, import_events, materialize};
pub use query::{
    MatchSummary, MatchesResult, NetworkLink, NetworkNode, NetworkParams, NetworkResult,
    PositionEntry, PositionsParams, PositionsResult, RosterPlayer, RosterResult, TeamEntry,
    TeamsResult, TopPasser, TopPassersParams, TopPassersResult, matches, network, positions,
    roster, teams, top_passers,
};

/// Failures while turning a raw event log into persisted graph data.
///
/// `EmptyMatchId` and `Events` are client faults detected before any write;
/// `Store` means the substrate failed mid-materialization and the match's
/// derived data must not be trusted until a re-import succeeds.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("match identifier must not be empty")]
    EmptyMatchId,
    #[error("invalid match events: {0}")]
    Events(#[from] passnet_parse::ParseError),
    #[error("store error: {0}")]
    Store(#[from] passnet_store::StoreError),
}

/// Failures while answering an aggregation query.
///
/// `EmptyMatchId` and `MissingTeamId` are client faults detected before the
/// substrate is touched; `Store` is a substrate read failure, safe to retry
/// since queries are side-effect-free. Zero matching rows is never an error.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("match identifier must not be empty")]
    EmptyMatchId,
    #[error("teamId is required")]
    MissingTeamId,
    #[error("store error: {0}")]
    Store(#[from] passnet_store::StoreError),
}
