//! redb-backed sector counter.

use std::{fmt::Display, path::Path};

use redb::{Database, ReadableTable, TableDefinition};
use tessera_api::{CounterError, CounterResult, SectorCounter};
use tessera_primitives::SectorNumber;
use tracing::{debug, trace};

/// Table definition for counters.
/// Key: counter name
/// Value: next value to hand out
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Key of the sector number counter.
const SECTOR_COUNTER_KEY: &str = "sector-number";

fn db_err(err: impl Display) -> CounterError {
    CounterError::Database(err.to_string())
}

/// Sector counter persisted in a redb database.
///
/// Each [`next`](SectorCounter::next) call is its own write transaction, so
/// a number is durable before it is returned. Numbering starts at 0.
pub struct RedbSectorCounter {
    db: Database,
}

impl RedbSectorCounter {
    /// Open or create a counter database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> CounterResult<Self> {
        let db = Database::create(path.as_ref()).map_err(db_err)?;

        // Ensure the counters table exists
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            let _ = write_txn.open_table(COUNTERS_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        debug!(path = %path.as_ref().display(), "Opened sector counter");
        Ok(Self { db })
    }

    /// The number the next call to [`next`](SectorCounter::next) returns.
    pub fn peek(&self) -> CounterResult<SectorNumber> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(COUNTERS_TABLE).map_err(db_err)?;
        let current = table
            .get(SECTOR_COUNTER_KEY)
            .map_err(db_err)?
            .map(|v| v.value())
            .unwrap_or(0);
        Ok(SectorNumber(current))
    }
}

impl SectorCounter for RedbSectorCounter {
    fn next(&self) -> CounterResult<SectorNumber> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let current = {
            let mut table = write_txn.open_table(COUNTERS_TABLE).map_err(db_err)?;
            let current = table
                .get(SECTOR_COUNTER_KEY)
                .map_err(db_err)?
                .map(|v| v.value())
                .unwrap_or(0);
            let next = current.checked_add(1).ok_or(CounterError::Exhausted)?;
            table.insert(SECTOR_COUNTER_KEY, next).map_err(db_err)?;
            current
        };
        write_txn.commit().map_err(db_err)?;

        trace!(number = current, "Issued sector number");
        Ok(SectorNumber(current))
    }
}
