use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use log::debug;
use uuid::Uuid;

use healthdash_model::measurement::{MeasurementRecord, MeasurementType, NewMeasurement};

use crate::{
    connection::Connection,
    error::{Result, StoreError},
};

/// Reference types every fresh database starts with.
const DEFAULT_TYPES: [(&str, &str); 2] = [("Waist", "cm"), ("Weight", "kg")];

#[derive(sqlx::FromRow)]
struct TypeRow {
    id: Uuid,
    name: String,
    unit: String,
}

impl From<TypeRow> for MeasurementType {
    fn from(row: TypeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            unit: row.unit,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: Uuid,
    user_id: Uuid,
    measurement_type_id: Uuid,
    value: f64,
    date: NaiveDate,
    created_at: NaiveDateTime,
    type_name: String,
    unit: String,
}

impl From<RecordRow> for MeasurementRecord {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            measurement_type_id: row.measurement_type_id,
            value: row.value,
            date: row.date,
            created_at: row.created_at,
            type_name: row.type_name,
            unit: row.unit,
        }
    }
}

const RECORD_QUERY: &str = "SELECT m.id, m.user_id, m.measurement_type_id, m.value, m.date,
        m.created_at, t.name AS type_name, t.unit
 FROM measurements m
 JOIN measurement_types t ON t.id = m.measurement_type_id";

#[mockall::automock]
#[async_trait]
pub trait MeasurementRepository: Send + Sync {
    /// Measurement types, name ascending.
    async fn fetch_types(&self) -> Result<Vec<MeasurementType>>;

    /// One user's records, newest first (date descending, then creation time
    /// descending), each annotated with its type's name and unit.
    async fn fetch_records(&self, user_id: Uuid) -> Result<Vec<MeasurementRecord>>;

    /// Stores a measurement. One row per user, type and calendar date; a
    /// second save on the same date replaces the value and creation time.
    async fn upsert_record(&self, measurement: NewMeasurement) -> Result<MeasurementRecord>;

    /// Deletes one record by id, scoped to the user owning it.
    async fn delete_record(&self, user_id: Uuid, id: Uuid) -> Result<()>;
}

#[derive(Clone)]
pub struct MeasurementRepositoryImpl {
    connection: Connection,
}

impl MeasurementRepositoryImpl {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Inserts the default reference types unless rows with those names
    /// already exist.
    pub async fn seed_default_types(&self) -> Result<()> {
        let mut conn = self.connection.lock().await;
        for (name, unit) in DEFAULT_TYPES {
            sqlx::query(
                "INSERT INTO measurement_types (id, name, unit)
                 SELECT ?, ?, ?
                 WHERE NOT EXISTS (SELECT 1 FROM measurement_types WHERE name = ?)",
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(unit)
            .bind(name)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MeasurementRepository for MeasurementRepositoryImpl {
    async fn fetch_types(&self) -> Result<Vec<MeasurementType>> {
        let mut conn = self.connection.lock().await;
        let rows: Vec<TypeRow> =
            sqlx::query_as("SELECT id, name, unit FROM measurement_types ORDER BY name ASC")
                .fetch_all(&mut *conn)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn fetch_records(&self, user_id: Uuid) -> Result<Vec<MeasurementRecord>> {
        debug!("Fetching records for user {}", user_id);
        let mut conn = self.connection.lock().await;
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            "{} WHERE m.user_id = ? ORDER BY m.date DESC, m.created_at DESC",
            RECORD_QUERY
        ))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_record(&self, measurement: NewMeasurement) -> Result<MeasurementRecord> {
        let created_at = measurement
            .created_at
            .unwrap_or_else(|| Utc::now().naive_utc());

        let mut conn = self.connection.lock().await;

        let known_type: Option<TypeRow> =
            sqlx::query_as("SELECT id, name, unit FROM measurement_types WHERE id = ?")
                .bind(measurement.measurement_type_id)
                .fetch_optional(&mut *conn)
                .await?;
        if known_type.is_none() {
            return Err(StoreError::UnknownType);
        }

        debug!(
            "Storing measurement for user {} on {}",
            measurement.user_id, measurement.date
        );
        sqlx::query(
            "INSERT INTO measurements (id, user_id, measurement_type_id, value, date, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, measurement_type_id, date)
             DO UPDATE SET value = excluded.value, created_at = excluded.created_at",
        )
        .bind(Uuid::new_v4())
        .bind(measurement.user_id)
        .bind(measurement.measurement_type_id)
        .bind(measurement.value)
        .bind(measurement.date)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        let row: RecordRow = sqlx::query_as(&format!(
            "{} WHERE m.user_id = ? AND m.measurement_type_id = ? AND m.date = ?",
            RECORD_QUERY
        ))
        .bind(measurement.user_id)
        .bind(measurement.measurement_type_id)
        .bind(measurement.date)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_record(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        debug!("Deleting record {} for user {}", id, user_id);
        let mut conn = self.connection.lock().await;
        let result = sqlx::query("DELETE FROM measurements WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use healthdash_model::trend;

    use super::*;

    async fn test_repository() -> MeasurementRepositoryImpl {
        let connection = Connection::open("sqlite::memory:").await.unwrap();
        let repository = MeasurementRepositoryImpl::new(connection);
        repository.seed_default_types().await.unwrap();
        repository
    }

    fn new_measurement(
        user_id: Uuid,
        type_id: Uuid,
        value: f64,
        date: &str,
        created_at: &str,
    ) -> NewMeasurement {
        NewMeasurement {
            user_id,
            measurement_type_id: type_id,
            value,
            date: date.parse().unwrap(),
            created_at: Some(created_at.parse().unwrap()),
        }
    }

    async fn type_id(repository: &MeasurementRepositoryImpl, name: &str) -> Uuid {
        repository
            .fetch_types()
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.name == name)
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn fetch_types_is_sorted_by_name() {
        let repository = test_repository().await;

        let types = repository.fetch_types().await.unwrap();

        let names: Vec<_> = types.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Waist", "Weight"]);
    }

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate_types() {
        let repository = test_repository().await;
        repository.seed_default_types().await.unwrap();

        assert_eq!(repository.fetch_types().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn upsert_returns_record_annotated_with_type() {
        let repository = test_repository().await;
        let user = Uuid::new_v4();
        let weight = type_id(&repository, "Weight").await;

        let record = repository
            .upsert_record(new_measurement(
                user,
                weight,
                80.0,
                "2024-06-02",
                "2024-06-02T08:00:00",
            ))
            .await
            .unwrap();

        assert_eq!(record.user_id, user);
        assert_eq!(record.value, 80.0);
        assert_eq!(record.type_name, "Weight");
        assert_eq!(record.unit, "kg");
    }

    #[tokio::test]
    async fn second_upsert_on_same_date_replaces_the_reading() {
        let repository = test_repository().await;
        let user = Uuid::new_v4();
        let weight = type_id(&repository, "Weight").await;

        repository
            .upsert_record(new_measurement(
                user,
                weight,
                80.0,
                "2024-06-02",
                "2024-06-02T08:00:00",
            ))
            .await
            .unwrap();
        repository
            .upsert_record(new_measurement(
                user,
                weight,
                79.4,
                "2024-06-02",
                "2024-06-02T20:30:00",
            ))
            .await
            .unwrap();

        let records = repository.fetch_records(user).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 79.4);
        assert_eq!(
            records[0].created_at,
            "2024-06-02T20:30:00".parse::<NaiveDateTime>().unwrap()
        );
    }

    #[tokio::test]
    async fn fetch_records_is_newest_first_with_creation_time_tiebreak() {
        let repository = test_repository().await;
        let user = Uuid::new_v4();
        let weight = type_id(&repository, "Weight").await;
        let waist = type_id(&repository, "Waist").await;

        repository
            .upsert_record(new_measurement(
                user,
                weight,
                78.5,
                "2024-06-01",
                "2024-06-01T08:00:00",
            ))
            .await
            .unwrap();
        repository
            .upsert_record(new_measurement(
                user,
                waist,
                90.0,
                "2024-06-01",
                "2024-06-01T09:00:00",
            ))
            .await
            .unwrap();
        repository
            .upsert_record(new_measurement(
                user,
                weight,
                80.0,
                "2024-06-02",
                "2024-06-02T07:00:00",
            ))
            .await
            .unwrap();

        let records = repository.fetch_records(user).await.unwrap();

        let values: Vec<_> = records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![80.0, 90.0, 78.5]);
    }

    #[tokio::test]
    async fn fetch_records_only_returns_own_records() {
        let repository = test_repository().await;
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let weight = type_id(&repository, "Weight").await;

        repository
            .upsert_record(new_measurement(
                other,
                weight,
                99.0,
                "2024-06-01",
                "2024-06-01T08:00:00",
            ))
            .await
            .unwrap();

        assert!(repository.fetch_records(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_rejects_unknown_type() {
        let repository = test_repository().await;

        let result = repository
            .upsert_record(new_measurement(
                Uuid::new_v4(),
                Uuid::new_v4(),
                80.0,
                "2024-06-02",
                "2024-06-02T08:00:00",
            ))
            .await;

        assert!(matches!(result, Err(StoreError::UnknownType)));
    }

    #[tokio::test]
    async fn delete_is_scoped_to_the_owning_user() {
        let repository = test_repository().await;
        let user = Uuid::new_v4();
        let weight = type_id(&repository, "Weight").await;

        let record = repository
            .upsert_record(new_measurement(
                user,
                weight,
                80.0,
                "2024-06-02",
                "2024-06-02T08:00:00",
            ))
            .await
            .unwrap();

        let result = repository.delete_record(Uuid::new_v4(), record.id).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
        assert_eq!(repository.fetch_records(user).await.unwrap().len(), 1);

        repository.delete_record(user, record.id).await.unwrap();
        assert!(repository.fetch_records(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_ordering_feeds_the_selector() {
        let repository = test_repository().await;
        let user = Uuid::new_v4();
        let weight = type_id(&repository, "Weight").await;
        let waist = type_id(&repository, "Waist").await;

        repository
            .upsert_record(new_measurement(
                user,
                weight,
                80.0,
                "2024-06-02",
                "2024-06-02T08:00:00",
            ))
            .await
            .unwrap();
        repository
            .upsert_record(new_measurement(
                user,
                weight,
                78.5,
                "2024-06-01",
                "2024-06-01T08:00:00",
            ))
            .await
            .unwrap();
        repository
            .upsert_record(new_measurement(
                user,
                waist,
                90.0,
                "2024-06-01",
                "2024-06-01T08:05:00",
            ))
            .await
            .unwrap();

        let records = repository.fetch_records(user).await.unwrap();
        let (latest, previous) = trend::select_latest_and_previous(&records);

        assert_eq!(latest["Weight"].value, 80.0);
        assert_eq!(latest["Waist"].value, 90.0);
        assert_eq!(previous["Weight"].value, 78.5);
        assert!(!previous.contains_key("Waist"));
    }
}
