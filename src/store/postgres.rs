//! PostgreSQL implementation of the store.
//!
//! Schema lives in `migrations/` and is applied on connect. The first row of
//! `events` is the global event; it is created if the table is empty.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{ExchangeStore, StoredParticipant};
use crate::config::DatabaseConfig;
use crate::domain::{
    DeliveryStatus, DisplayName, Event, EventId, Gift, GiftId, GiftImage, Participant,
    ParticipantId, RevealOutcome,
};
use crate::error::ExchangeError;

type EventRow = (Uuid, String, bool, Option<DateTime<Utc>>, DateTime<Utc>);
type ParticipantRow = (Uuid, String, bool, DateTime<Utc>, String);
type GiftRow = (
    Uuid,
    Uuid,
    Uuid,
    String,
    serde_json::Value,
    Option<String>,
    bool,
    DateTime<Utc>,
);

const GIFT_COLUMNS: &str = "id, from_participant_id, to_participant_id, status, images, \
                            message, is_unlocked, created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    event_id: EventId,
}

fn db_err(e: sqlx::Error) -> ExchangeError {
    ExchangeError::PersistenceError(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn event_from_row((id, name, is_revealed, revealed_at, created_at): EventRow) -> Event {
    Event {
        id: EventId::from_uuid(id),
        name,
        is_revealed,
        revealed_at,
        created_at,
    }
}

fn participant_from_row(
    (id, display_name, is_ready, joined_at, key_hash): ParticipantRow,
) -> Result<StoredParticipant, ExchangeError> {
    Ok(StoredParticipant {
        participant: Participant {
            id: ParticipantId::from_uuid(id),
            display_name: DisplayName::parse(&display_name)?,
            is_ready,
            joined_at,
        },
        key_hash,
    })
}

fn gift_from_row(
    (id, from, to, status, images, message, is_unlocked, created_at): GiftRow,
) -> Result<Gift, ExchangeError> {
    let images: Vec<GiftImage> = serde_json::from_value(images)
        .map_err(|e| ExchangeError::PersistenceError(format!("corrupt images column: {e}")))?;
    Ok(Gift {
        id: GiftId::from_uuid(id),
        from_participant_id: ParticipantId::from_uuid(from),
        to_participant_id: ParticipantId::from_uuid(to),
        status: status.parse::<DeliveryStatus>()?,
        images,
        message,
        is_unlocked,
        created_at,
    })
}

fn images_json(images: &[GiftImage]) -> Result<serde_json::Value, ExchangeError> {
    serde_json::to_value(images).map_err(|e| ExchangeError::Internal(e.to_string()))
}

impl PostgresStore {
    /// Connects, runs migrations and ensures the global event exists.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &DatabaseConfig, event_name: &str) -> Result<Self, ExchangeError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(db_err)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| ExchangeError::PersistenceError(e.to_string()))?;

        let event_id = ensure_event(&pool, event_name).await?;
        tracing::info!(%event_id, "postgres store ready");
        Ok(Self { pool, event_id })
    }
}

async fn ensure_event(pool: &PgPool, event_name: &str) -> Result<EventId, ExchangeError> {
    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM events ORDER BY created_at ASC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .map_err(db_err)?;
    if let Some(id) = existing {
        return Ok(EventId::from_uuid(id));
    }

    let event = Event::new(event_name);
    sqlx::query("INSERT INTO events (id, name, is_revealed, created_at) VALUES ($1, $2, FALSE, $3)")
        .bind(*event.id.as_uuid())
        .bind(&event.name)
        .bind(event.created_at)
        .execute(pool)
        .await
        .map_err(db_err)?;
    tracing::info!(event_id = %event.id, name = %event.name, "created event");
    Ok(event.id)
}

#[async_trait]
impl ExchangeStore for PostgresStore {
    async fn event(&self) -> Result<Event, ExchangeError> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, name, is_revealed, revealed_at, created_at FROM events WHERE id = $1",
        )
        .bind(*self.event_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(event_from_row(row))
    }

    async fn reveal_if_all_ready(&self) -> Result<RevealOutcome, ExchangeError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        // SHARE mode blocks participant writes until commit.
        sqlx::query("LOCK TABLE participants IN SHARE MODE")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, name, is_revealed, revealed_at, created_at FROM events \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(*self.event_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;
        let mut event = event_from_row(row);
        let roster = sqlx::query_as::<_, ParticipantRow>(
            "SELECT id, display_name, is_ready, joined_at, key_hash FROM participants \
             WHERE event_id = $1",
        )
        .bind(*self.event_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|row| participant_from_row(row).map(|stored| stored.participant))
        .collect::<Result<Vec<_>, _>>()?;

        let outcome = event.request_reveal(&roster);
        if outcome == RevealOutcome::Revealed {
            sqlx::query("UPDATE events SET is_revealed = TRUE, revealed_at = $2 WHERE id = $1")
                .bind(*self.event_id.as_uuid())
                .bind(event.revealed_at)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(outcome)
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, ExchangeError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            "SELECT id, display_name, is_ready, joined_at, key_hash FROM participants \
             WHERE event_id = $1 ORDER BY joined_at ASC, id ASC",
        )
        .bind(*self.event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|row| participant_from_row(row).map(|stored| stored.participant))
            .collect()
    }

    async fn find_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<StoredParticipant>, ExchangeError> {
        let row = sqlx::query_as::<_, ParticipantRow>(
            "SELECT id, display_name, is_ready, joined_at, key_hash FROM participants \
             WHERE event_id = $1 AND id = $2",
        )
        .bind(*self.event_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(participant_from_row).transpose()
    }

    async fn insert_participant(&self, row: StoredParticipant) -> Result<(), ExchangeError> {
        let p = &row.participant;
        sqlx::query(
            "INSERT INTO participants (id, event_id, display_name, name_key, is_ready, key_hash, joined_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*p.id.as_uuid())
        .bind(*self.event_id.as_uuid())
        .bind(p.display_name.as_str())
        .bind(p.display_name.normalized())
        .bind(p.is_ready)
        .bind(&row.key_hash)
        .bind(p.joined_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ExchangeError::NameTaken(p.display_name.to_string())
            } else {
                db_err(e)
            }
        })?;
        Ok(())
    }

    async fn update_participant(&self, participant: &Participant) -> Result<(), ExchangeError> {
        let result = sqlx::query(
            "UPDATE participants SET display_name = $3, name_key = $4, is_ready = $5 \
             WHERE event_id = $1 AND id = $2",
        )
        .bind(*self.event_id.as_uuid())
        .bind(*participant.id.as_uuid())
        .bind(participant.display_name.as_str())
        .bind(participant.display_name.normalized())
        .bind(participant.is_ready)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ExchangeError::NameTaken(participant.display_name.to_string())
            } else {
                db_err(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(ExchangeError::ParticipantNotFound(participant.id));
        }
        Ok(())
    }

    async fn remove_participant(&self, id: ParticipantId) -> Result<(), ExchangeError> {
        // Gifts referencing the participant go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM participants WHERE event_id = $1 AND id = $2")
            .bind(*self.event_id.as_uuid())
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(ExchangeError::ParticipantNotFound(id));
        }
        Ok(())
    }

    async fn list_gifts(&self) -> Result<Vec<Gift>, ExchangeError> {
        let rows = sqlx::query_as::<_, GiftRow>(&format!(
            "SELECT {GIFT_COLUMNS} FROM gifts WHERE event_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(*self.event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(gift_from_row).collect()
    }

    async fn get_gift(&self, id: GiftId) -> Result<Gift, ExchangeError> {
        let row = sqlx::query_as::<_, GiftRow>(&format!(
            "SELECT {GIFT_COLUMNS} FROM gifts WHERE event_id = $1 AND id = $2"
        ))
        .bind(*self.event_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(ExchangeError::GiftNotFound(id))?;

        gift_from_row(row)
    }

    async fn insert_gift(&self, gift: Gift) -> Result<(), ExchangeError> {
        sqlx::query(&format!(
            "INSERT INTO gifts (event_id, {GIFT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(*self.event_id.as_uuid())
        .bind(*gift.id.as_uuid())
        .bind(*gift.from_participant_id.as_uuid())
        .bind(*gift.to_participant_id.as_uuid())
        .bind(gift.status.as_str())
        .bind(images_json(&gift.images)?)
        .bind(gift.message.as_deref())
        .bind(gift.is_unlocked)
        .bind(gift.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ExchangeError::UnknownRecipient(gift.to_participant_id)
            } else {
                db_err(e)
            }
        })?;
        Ok(())
    }

    async fn update_gift(&self, gift: &Gift) -> Result<(), ExchangeError> {
        let result = sqlx::query(
            "UPDATE gifts SET status = $3, images = $4, message = $5, is_unlocked = $6 \
             WHERE event_id = $1 AND id = $2",
        )
        .bind(*self.event_id.as_uuid())
        .bind(*gift.id.as_uuid())
        .bind(gift.status.as_str())
        .bind(images_json(&gift.images)?)
        .bind(gift.message.as_deref())
        .bind(gift.is_unlocked)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(ExchangeError::GiftNotFound(gift.id));
        }
        Ok(())
    }

    async fn delete_gift(&self, id: GiftId) -> Result<(), ExchangeError> {
        let result = sqlx::query("DELETE FROM gifts WHERE event_id = $1 AND id = $2")
            .bind(*self.event_id.as_uuid())
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(ExchangeError::GiftNotFound(id));
        }
        Ok(())
    }
}
