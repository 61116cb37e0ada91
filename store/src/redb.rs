//! Redb-based persistent record store.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::RwLock;

use ::redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{RecordStore, StoreError, StoreResult};

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

/// A persistent record store backed by redb.
///
/// Ids and records are encoded with MessagePack. `close` drops the
/// database handle, releasing the file lock.
pub struct RedbStore<I, R> {
    db: RwLock<Option<Database>>,
    _marker: PhantomData<fn() -> (I, R)>,
}

fn storage(e: impl ToString) -> StoreError {
    StoreError::Storage(e.to_string())
}

fn encode<T: Serialize + ?Sized>(value: &T) -> StoreResult<Vec<u8>> {
    rmp_serde::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    rmp_serde::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl<I, R> RedbStore<I, R> {
    /// Open or create a redb store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path).map_err(storage)?;

        // Create the table if it doesn't exist
        let tx = db.begin_write().map_err(storage)?;
        {
            let _ = tx.open_table(TABLE).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;

        Ok(Self {
            db: RwLock::new(Some(db)),
            _marker: PhantomData,
        })
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.db.read().map_err(storage)?;
        match guard.as_ref() {
            Some(db) => f(db),
            None => Err(StoreError::Closed),
        }
    }
}

impl<I, R> RecordStore<I, R> for RedbStore<I, R>
where
    I: Serialize + DeserializeOwned,
    R: Serialize + DeserializeOwned,
{
    fn put(&self, id: &I, record: &R) -> StoreResult<()> {
        let key = encode(id)?;
        let value = encode(record)?;
        self.with_db(|db| {
            let tx = db.begin_write().map_err(storage)?;
            {
                let mut table = tx.open_table(TABLE).map_err(storage)?;
                table
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(storage)?;
            }
            tx.commit().map_err(storage)
        })
    }

    fn get(&self, id: &I) -> StoreResult<R> {
        let key = encode(id)?;
        self.with_db(|db| {
            let tx = db.begin_read().map_err(storage)?;
            let table = tx.open_table(TABLE).map_err(storage)?;
            match table.get(key.as_slice()).map_err(storage)? {
                Some(value) => decode(value.value()),
                None => Err(StoreError::NotFound),
            }
        })
    }

    fn all(&self) -> StoreResult<Vec<(I, R)>> {
        self.with_db(|db| {
            let tx = db.begin_read().map_err(storage)?;
            let table = tx.open_table(TABLE).map_err(storage)?;

            let mut results = Vec::new();
            for item in table.iter().map_err(storage)? {
                let (key, value) = item.map_err(storage)?;
                results.push((decode(key.value())?, decode(value.value())?));
            }
            Ok(results)
        })
    }

    fn len(&self) -> StoreResult<usize> {
        self.with_db(|db| {
            let tx = db.begin_read().map_err(storage)?;
            let table = tx.open_table(TABLE).map_err(storage)?;
            let len = table.len().map_err(storage)?;
            Ok(len as usize)
        })
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self.db.write().map_err(storage)?;
        guard.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Disc {
        artist: String,
        title: String,
        year: Option<u16>,
    }

    fn disc(artist: &str, title: &str) -> Disc {
        Disc {
            artist: artist.into(),
            title: title.into(),
            year: None,
        }
    }

    #[test]
    fn test_redb_basic() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        let abba = disc("ABBA", "Waterloo");
        store.put(&"d1".to_string(), &abba).unwrap();
        assert_eq!(store.get(&"d1".to_string()).unwrap(), abba);
        assert_eq!(store.get(&"d2".to_string()), Err(StoreError::NotFound));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_redb_all() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.put(&1u32, &disc("Queen", "Innuendo")).unwrap();
        store.put(&2u32, &disc("Queen", "Jazz")).unwrap();
        store.put(&1u32, &disc("Queen", "A Kind of Magic")).unwrap();

        let mut all = store.all().unwrap();
        all.sort_by_key(|(id, _)| *id);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].1.title, "A Kind of Magic");
        assert_eq!(all[1].1.title, "Jazz");
    }

    #[test]
    fn test_redb_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.put(&7u64, &disc("Blur", "Parklife")).unwrap();
            store.close().unwrap();
            assert_eq!(store.get(&7), Err(StoreError::Closed));
        }
        let store: RedbStore<u64, Disc> = RedbStore::open(&path).unwrap();
        assert_eq!(store.get(&7).unwrap().artist, "Blur");
    }
}
