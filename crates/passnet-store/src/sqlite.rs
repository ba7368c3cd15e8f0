use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use passnet_config::graph_db_path;
use passnet_core::{MinuteWindow, PassEvent, PassFilter, TeamId, TeamRef};
use rusqlite::{Connection, params};

use super::{
    GraphStore, MatchRow, NetworkLinkRow, PasserRow, PlayerRow, PositionRow, StoreError, TeamRow,
};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Property-graph substrate over SQLite. Each operation acquires its own
/// connection (released by drop on every exit path) and executes as one
/// transactional unit, bounded by the busy timeout.
pub struct SqliteGraphStore {
    sqlite_path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteGraphStore {
    pub fn open(workspace_root: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_timeout(workspace_root, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with_timeout(
        workspace_root: impl AsRef<Path>,
        busy_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let sqlite_path = graph_db_path(workspace_root);
        if let Some(parent) = sqlite_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&sqlite_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(busy_timeout)?;
        run_migrations(&conn)?;
        drop(conn);

        Ok(Self {
            sqlite_path,
            busy_timeout,
        })
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    fn connection(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.sqlite_path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

impl GraphStore for SqliteGraphStore {
    fn ping(&self) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn replace_match(
        &self,
        match_id: &str,
        imported_at_ms: i64,
        teams: &[TeamRef],
        passes: &[PassEvent],
    ) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        // Delete-then-recreate runs inside one transaction so no reader can
        // observe the match absent or half-imported.
        tx.execute("DELETE FROM passes WHERE match_id = ?1", params![match_id])?;
        tx.execute(
            "DELETE FROM match_teams WHERE match_id = ?1",
            params![match_id],
        )?;
        tx.execute("DELETE FROM matches WHERE match_id = ?1", params![match_id])?;
        tx.execute(
            "INSERT INTO matches (match_id, imported_at) VALUES (?1, ?2)",
            params![match_id, imported_at_ms],
        )?;

        {
            let mut merge_team = tx.prepare(
                "INSERT INTO teams (team_id, name) VALUES (?1, ?2)
                 ON CONFLICT(team_id) DO NOTHING",
            )?;
            let mut involve_team = tx.prepare(
                "INSERT OR IGNORE INTO match_teams (match_id, team_id) VALUES (?1, ?2)",
            )?;
            for team in teams {
                merge_team.execute(params![team.id, team.name])?;
                involve_team.execute(params![match_id, team.id])?;
            }

            let mut merge_player = tx.prepare(
                "INSERT INTO players (player_id, name) VALUES (?1, ?2)
                 ON CONFLICT(player_id) DO NOTHING",
            )?;
            let mut has_player = tx.prepare(
                "INSERT OR IGNORE INTO team_players (team_id, player_id) VALUES (?1, ?2)",
            )?;
            let mut insert_pass = tx.prepare(
                "INSERT INTO passes (
                     match_id, event_id, team_id, from_id, to_id,
                     minute, second, timestamp,
                     start_x, start_y, end_x, end_y, length,
                     under_pressure, successful
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;

            for pass in passes {
                merge_player.execute(params![pass.from_id, pass.from_name])?;
                merge_player.execute(params![pass.to_id, pass.to_name])?;

                if let Some(team_id) = pass.team_id {
                    // A pass may carry a team id the registry never named;
                    // the team node is still merged, nameless.
                    merge_team.execute(params![team_id, ""])?;
                    has_player.execute(params![team_id, pass.from_id])?;
                    has_player.execute(params![team_id, pass.to_id])?;
                }

                // Pass edges are multi-edges: always created, never merged.
                insert_pass.execute(params![
                    match_id,
                    pass.event_id,
                    pass.team_id,
                    pass.from_id,
                    pass.to_id,
                    pass.minute,
                    pass.second,
                    pass.timestamp,
                    pass.start_x,
                    pass.start_y,
                    pass.end_x,
                    pass.end_y,
                    pass.length,
                    pass.under_pressure,
                    pass.successful,
                ])?;
            }
        }

        tx.commit()?;

        tracing::debug!(
            match_id,
            teams = teams.len(),
            passes = passes.len(),
            "replaced match graph"
        );
        Ok(())
    }

    fn network_links(
        &self,
        match_id: &str,
        filter: &PassFilter,
    ) -> Result<Vec<NetworkLinkRow>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT p.from_id, a.name, p.to_id, b.name, COUNT(*) AS passes
            FROM passes p
            JOIN players a ON a.player_id = p.from_id
            JOIN players b ON b.player_id = p.to_id
            WHERE p.match_id = ?1
              AND p.minute >= ?2 AND p.minute < ?3
              AND (?4 IS NULL OR p.team_id = ?4)
              AND (?5 = 0 OR p.successful = 1)
            GROUP BY p.from_id, p.to_id
            ORDER BY passes DESC
            "#,
        )?;

        let rows = stmt.query_map(
            params![
                match_id,
                filter.window.from_min,
                filter.window.to_min,
                filter.team_id,
                i64::from(filter.successful_only),
            ],
            |row| {
                Ok(NetworkLinkRow {
                    from_id: row.get(0)?,
                    from_name: row.get(1)?,
                    to_id: row.get(2)?,
                    to_name: row.get(3)?,
                    count: row.get(4)?,
                })
            },
        )?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn match_players(
        &self,
        match_id: &str,
        team_id: Option<TeamId>,
    ) -> Result<Vec<PlayerRow>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT pl.player_id, pl.name
            FROM players pl
            JOIN passes p ON pl.player_id = p.from_id OR pl.player_id = p.to_id
            WHERE p.match_id = ?1
              AND (?2 IS NULL OR p.team_id = ?2)
            ORDER BY pl.name ASC, pl.player_id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![match_id, team_id], |row| {
            Ok(PlayerRow {
                player_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn average_positions(
        &self,
        match_id: &str,
        window: &MinuteWindow,
        team_id: Option<TeamId>,
    ) -> Result<Vec<PositionRow>, StoreError> {
        let conn = self.connection()?;
        // Averages only consider passes with a complete start coordinate
        // pair; the count covers every qualifying pass.
        let mut stmt = conn.prepare(
            r#"
            SELECT
                p.from_id,
                a.name,
                AVG(CASE WHEN p.start_x IS NOT NULL AND p.start_y IS NOT NULL
                         THEN p.start_x END) AS avg_x,
                AVG(CASE WHEN p.start_x IS NOT NULL AND p.start_y IS NOT NULL
                         THEN p.start_y END) AS avg_y,
                COUNT(*) AS passes_made
            FROM passes p
            JOIN players a ON a.player_id = p.from_id
            WHERE p.match_id = ?1
              AND p.minute >= ?2 AND p.minute < ?3
              AND (?4 IS NULL OR p.team_id = ?4)
            GROUP BY p.from_id
            ORDER BY passes_made DESC
            "#,
        )?;

        let rows = stmt.query_map(
            params![match_id, window.from_min, window.to_min, team_id],
            |row| {
                Ok(PositionRow {
                    player_id: row.get(0)?,
                    name: row.get(1)?,
                    avg_x: row.get(2)?,
                    avg_y: row.get(3)?,
                    passes_made: row.get(4)?,
                })
            },
        )?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn top_passers(
        &self,
        match_id: &str,
        team_id: TeamId,
        window: &MinuteWindow,
        limit: i64,
    ) -> Result<Vec<PasserRow>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                p.from_id,
                a.name,
                COUNT(*) AS attempts,
                SUM(CASE WHEN p.successful = 1 THEN 1 ELSE 0 END) AS completed
            FROM passes p
            JOIN players a ON a.player_id = p.from_id
            WHERE p.match_id = ?1
              AND p.team_id = ?2
              AND p.minute >= ?3 AND p.minute < ?4
            GROUP BY p.from_id
            ORDER BY attempts DESC
            LIMIT ?5
            "#,
        )?;

        let rows = stmt.query_map(
            params![match_id, team_id, window.from_min, window.to_min, limit],
            |row| {
                Ok(PasserRow {
                    player_id: row.get(0)?,
                    name: row.get(1)?,
                    attempts: row.get(2)?,
                    completed: row.get(3)?,
                })
            },
        )?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn list_matches(&self) -> Result<Vec<MatchRow>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT match_id, imported_at
            FROM matches
            ORDER BY imported_at DESC, match_id ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(MatchRow {
                match_id: row.get(0)?,
                imported_at: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn match_teams(&self, match_id: &str) -> Result<Vec<TeamRow>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.team_id, t.name
            FROM match_teams mt
            JOIN teams t ON t.team_id = mt.team_id
            WHERE mt.match_id = ?1
            ORDER BY t.name ASC, t.team_id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![match_id], |row| {
            Ok(TeamRow {
                team_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            match_id TEXT PRIMARY KEY,
            imported_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS teams (
            team_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS match_teams (
            match_id TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            PRIMARY KEY (match_id, team_id)
        );

        CREATE TABLE IF NOT EXISTS team_players (
            team_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            PRIMARY KEY (team_id, player_id)
        );

        CREATE TABLE IF NOT EXISTS passes (
            pass_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL,
            event_id TEXT,
            team_id INTEGER,
            from_id INTEGER NOT NULL,
            to_id INTEGER NOT NULL,
            minute INTEGER,
            second INTEGER,
            timestamp TEXT,
            start_x REAL,
            start_y REAL,
            end_x REAL,
            end_y REAL,
            length REAL,
            under_pressure INTEGER NOT NULL,
            successful INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_passes_match ON passes (match_id);
        "#,
    )?;

    Ok(())
}
