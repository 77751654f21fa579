//! `SQLite`-backed storage keyed by study name.

use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rusqlite::{Connection, OptionalExtension};

use super::{MemoryStorage, Storage};
use crate::error::Error;
use crate::trial::CompletedTrial;
use crate::types::Direction;

fn storage_err(e: impl ToString) -> Error {
    Error::Storage(e.to_string())
}

/// A storage backend that persists trials of one named study in a
/// `SQLite` database.
///
/// Several studies can share a database file; each is identified by its
/// name. Opening a name that already exists resumes that study: its
/// trials are loaded into memory and new trial IDs continue after the
/// last stored one.
///
/// # Examples
///
/// ```no_run
/// use rrtune::Direction;
/// use rrtune::storage::SqliteStorage;
///
/// let storage = SqliteStorage::open(
///     "studies.db",
///     "hyperparam-opt-test1",
///     &[Direction::Minimize; 4],
///     true,
/// )
/// .unwrap();
/// ```
pub struct SqliteStorage {
    memory: MemoryStorage,
    conn: Mutex<Connection>,
    study_id: i64,
}

impl SqliteStorage {
    /// Opens (or creates) the study `study_name` in the database at `path`.
    ///
    /// The database file and schema are created if missing. WAL mode is
    /// enabled.
    ///
    /// # Errors
    ///
    /// - [`Error::StudyAlreadyExists`] if the study exists and
    ///   `load_if_exists` is `false`.
    /// - [`Error::StudyDirectionMismatch`] if the stored study was created
    ///   with different directions.
    /// - [`Error::Storage`] for any database or decoding failure.
    pub fn open(
        path: impl AsRef<Path>,
        study_name: &str,
        directions: &[Direction],
        load_if_exists: bool,
    ) -> crate::Result<Self> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::from_connection(conn, study_name, directions, load_if_exists)
    }

    /// Like [`open`](Self::open) but on a private in-memory database.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_in_memory(study_name: &str, directions: &[Direction]) -> crate::Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::from_connection(conn, study_name, directions, false)
    }

    fn from_connection(
        conn: Connection,
        study_name: &str,
        directions: &[Direction],
        load_if_exists: bool,
    ) -> crate::Result<Self> {
        // WAL mode: concurrent readers, single writer.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(storage_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS studies (
                study_id   INTEGER PRIMARY KEY AUTOINCREMENT,
                study_name TEXT NOT NULL UNIQUE,
                directions TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS trials (
                study_id INTEGER NOT NULL REFERENCES studies(study_id),
                trial_id INTEGER NOT NULL,
                state    TEXT NOT NULL,
                data     TEXT NOT NULL,
                PRIMARY KEY (study_id, trial_id)
            );",
        )
        .map_err(storage_err)?;

        let requested = serde_json::to_string(directions).map_err(storage_err)?;

        let existing: Option<(i64, String)> = conn
            .query_row(
                "SELECT study_id, directions FROM studies WHERE study_name = ?1",
                [study_name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage_err)?;

        let study_id = match existing {
            Some((_, _)) if !load_if_exists => {
                return Err(Error::StudyAlreadyExists(study_name.to_owned()));
            }
            Some((id, stored)) => {
                if stored != requested {
                    return Err(Error::StudyDirectionMismatch {
                        study_name: study_name.to_owned(),
                        stored,
                        requested,
                    });
                }
                trace_info!(study_name, "resuming stored study");
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO studies (study_name, directions) VALUES (?1, ?2)",
                    rusqlite::params![study_name, requested],
                )
                .map_err(storage_err)?;
                conn.last_insert_rowid()
            }
        };

        let trials = load_all(&conn, study_id)?;

        Ok(Self {
            memory: MemoryStorage::with_trials(trials),
            conn: Mutex::new(conn),
            study_id,
        })
    }

    fn write_trial(&self, trial: &CompletedTrial) -> crate::Result<()> {
        let data = serde_json::to_string(trial).map_err(storage_err)?;
        let state = format!("{:?}", trial.state);

        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO trials (study_id, trial_id, state, data)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                self.study_id,
                i64::try_from(trial.id).unwrap_or(i64::MAX),
                state,
                data
            ],
        )
        .map_err(storage_err)?;

        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn push(&self, trial: CompletedTrial) -> crate::Result<()> {
        self.write_trial(&trial)?;
        self.memory.push(trial)
    }

    fn trials_arc(&self) -> &Arc<RwLock<Vec<CompletedTrial>>> {
        self.memory.trials_arc()
    }

    fn next_trial_id(&self) -> u64 {
        self.memory.next_trial_id()
    }
}

/// Load every trial of one study, ordered by id.
fn load_all(conn: &Connection, study_id: i64) -> crate::Result<Vec<CompletedTrial>> {
    let mut stmt = conn
        .prepare("SELECT data FROM trials WHERE study_id = ?1 ORDER BY trial_id")
        .map_err(storage_err)?;

    let rows = stmt
        .query_map([study_id], |row| row.get::<_, String>(0))
        .map_err(storage_err)?;

    let mut trials = Vec::new();
    for row in rows {
        let data = row.map_err(storage_err)?;
        let trial: CompletedTrial = serde_json::from_str(&data).map_err(storage_err)?;
        trials.push(trial);
    }

    Ok(trials)
}
