//! `SQLite` implementation of [`RecordStore`].

use std::future::Future;

use sqlx::SqlitePool;

use vdev_app::ports::RecordStore;
use vdev_domain::error::VdevError;
use vdev_domain::id::DeviceId;
use vdev_domain::record::DeviceRecord;

use crate::error::StorageError;

const UPSERT: &str = "INSERT INTO device_records (device_id, record, updated_at) \
     VALUES (?, ?, datetime('now')) \
     ON CONFLICT (device_id) DO UPDATE SET record = excluded.record, updated_at = excluded.updated_at";
const SELECT_BY_ID: &str = "SELECT record FROM device_records WHERE device_id = ?";
const DELETE_BY_ID: &str = "DELETE FROM device_records WHERE device_id = ?";

/// `SQLite`-backed record store. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RecordStore for SqliteRecordStore {
    fn load(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, VdevError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<(String,)> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.value())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            row.map(|(json,)| serde_json::from_str(&json).map_err(StorageError::from))
                .transpose()
                .map_err(VdevError::from)
        }
    }

    fn save(
        &self,
        id: DeviceId,
        record: DeviceRecord,
    ) -> impl Future<Output = Result<(), VdevError>> + Send {
        let pool = self.pool.clone();
        async move {
            let json = serde_json::to_string(&record).map_err(StorageError::from)?;
            sqlx::query(UPSERT)
                .bind(id.value())
                .bind(json)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        }
    }

    fn delete(&self, id: DeviceId) -> impl Future<Output = Result<(), VdevError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(DELETE_BY_ID)
                .bind(id.value())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use vdev_domain::status::{SwitchStatus, ToggleStatus};

    async fn store() -> SqliteRecordStore {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteRecordStore::new(db.pool().clone())
    }

    #[tokio::test]
    async fn should_return_none_for_missing_record() {
        let store = store().await;
        assert_eq!(store.load(DeviceId::new(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_roundtrip_record() {
        let store = store().await;
        let record = DeviceRecord::Toggle {
            status: ToggleStatus::On,
            on_duration: 30,
            off_duration: 15,
        };
        store.save(DeviceId::new(4), record.clone()).await.unwrap();
        assert_eq!(store.load(DeviceId::new(4)).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn should_overwrite_existing_record() {
        let store = store().await;
        let id = DeviceId::new(4);
        store
            .save(
                id,
                DeviceRecord::Switch {
                    status: SwitchStatus::Off,
                    delay: 10,
                },
            )
            .await
            .unwrap();
        store
            .save(
                id,
                DeviceRecord::Switch {
                    status: SwitchStatus::On,
                    delay: 20,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            store.load(id).await.unwrap(),
            Some(DeviceRecord::Switch {
                status: SwitchStatus::On,
                delay: 20
            })
        );
    }

    #[tokio::test]
    async fn should_delete_record() {
        let store = store().await;
        let id = DeviceId::new(9);
        store
            .save(
                id,
                DeviceRecord::Switch {
                    status: SwitchStatus::On,
                    delay: 0,
                },
            )
            .await
            .unwrap();
        store.delete(id).await.unwrap();
        assert_eq!(store.load(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_keep_records_separate_per_device() {
        let store = store().await;
        store
            .save(DeviceId::new(1), DeviceRecord::Level { level: 40 })
            .await
            .unwrap();
        store
            .save(DeviceId::new(2), DeviceRecord::Level { level: 80 })
            .await
            .unwrap();

        assert_eq!(
            store.load(DeviceId::new(1)).await.unwrap(),
            Some(DeviceRecord::Level { level: 40 })
        );
        assert_eq!(
            store.load(DeviceId::new(2)).await.unwrap(),
            Some(DeviceRecord::Level { level: 80 })
        );
    }
}
