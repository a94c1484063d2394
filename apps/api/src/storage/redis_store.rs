use std::sync::Mutex;

use redis::{Commands, Connection};
use tracing::info;

use super::{KvStore, StorageError};

/// Redis-backed store over a single synchronous connection.
pub struct RedisStore {
    conn: Mutex<Connection>,
}

impl RedisStore {
    pub fn open(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection()?;
        info!("Redis connection established");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KvStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(conn.get(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        conn.set::<_, _, ()>(key, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        conn.del::<_, ()>(key)?;
        Ok(())
    }
}
