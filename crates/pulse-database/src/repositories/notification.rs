//! sqlx-backed notification store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::warn;
use uuid::Uuid;

use pulse_core::error::{AppError, ErrorKind};
use pulse_core::result::AppResult;
use pulse_core::types::pagination::{PageRequest, PageResponse};
use pulse_core::types::sorting::SortOrder;
use pulse_entity::notification::model::derive_state;
use pulse_entity::{
    Channel, DeliveryOutcome, KindSummary, NewNotification, Notification, NotificationFilter,
    NotificationKind, NotificationSort, NotificationState,
};

use crate::store::NotificationStore;

/// Retries before giving up on an optimistic per-channel update.
const CAS_MAX_RETRIES: usize = 8;

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Concrete [`NotificationStore`] over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Create a new store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &NotificationFilter) {
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
        if let Some(read_flag) = filter.read_flag {
            builder.push(" AND read_flag = ").push_bind(read_flag);
        }
        if let Some(state) = filter.state {
            builder.push(" AND state = ").push_bind(state.as_str());
        }
        if let Some(priority) = filter.priority {
            builder.push(" AND priority = ").push_bind(priority.as_str());
        }
        if !filter.include_expired {
            builder.push(" AND (expires_at IS NULL OR expires_at > NOW())");
        }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, draft: &NewNotification) -> AppResult<Notification> {
        let per_channel = draft.initial_per_channel();
        let state = derive_state(&per_channel, false, u32::MAX);

        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications \
             (id, recipient_id, producer, title, body, kind, priority, state, read_flag, \
              metadata, per_channel, scheduled_at, expires_at, idempotency_key, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, $10, $11, $12, $13, NOW(), NOW()) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(draft.recipient_id)
        .bind(&draft.producer)
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(draft.kind.as_str())
        .bind(draft.priority.as_str())
        .bind(state.as_str())
        .bind(&draft.metadata)
        .bind(Json(&per_channel))
        .bind(draft.scheduled_at)
        .bind(draft.expires_at)
        .bind(&draft.idempotency_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Two producers racing on the same idempotency key lose to
            // the partial unique index rather than inserting twice.
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    return AppError::conflict("Duplicate idempotency key");
                }
            }
            AppError::with_source(ErrorKind::Database, "Failed to create notification", e)
        })
    }

    async fn find_for_recipient(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> AppResult<Option<Notification>> {
        // Expired records are hidden from recipient-facing reads, same
        // as list and count.
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE id = $1 AND recipient_id = $2 \
               AND (expires_at IS NULL OR expires_at > NOW())",
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch notification", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to fetch notification", e)
            })
    }

    async fn find_by_idempotency_key(
        &self,
        producer: &str,
        key: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE producer = $1 AND idempotency_key = $2 AND created_at >= $3",
        )
        .bind(producer)
        .bind(key)
        .bind(since)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed idempotency lookup", e)
        })
    }

    async fn list(
        &self,
        recipient_id: Uuid,
        filter: &NotificationFilter,
        sort: NotificationSort,
        order: SortOrder,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let mut count_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM notifications WHERE recipient_id = ");
        count_builder.push_bind(recipient_id);
        Self::push_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
            })?;

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT * FROM notifications WHERE recipient_id = ");
        builder.push_bind(recipient_id);
        Self::push_filter(&mut builder, filter);
        // Sort column and direction come from closed enums, never user text.
        builder.push(format!(
            " ORDER BY {} {}, id DESC",
            sort.as_column(),
            order.as_sql()
        ));
        builder.push(" LIMIT ").push_bind(page.limit());
        builder.push(" OFFSET ").push_bind(page.offset());

        let items = builder
            .build_query_as::<Notification>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list notifications", e)
            })?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn count_unread(
        &self,
        recipient_id: Uuid,
        kind: Option<NotificationKind>,
    ) -> AppResult<i64> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM notifications \
             WHERE read_flag = FALSE AND (expires_at IS NULL OR expires_at > NOW()) \
               AND recipient_id = ",
        );
        builder.push_bind(recipient_id);
        if let Some(kind) = kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }

        builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))
    }

    async fn group_by_kind(
        &self,
        recipient_id: Uuid,
        include_read: bool,
        limit: i64,
    ) -> AppResult<Vec<KindSummary>> {
        // Counts honor include_read; the latest record per kind is always
        // the newest regardless of read state.
        let read_predicate = if include_read {
            ""
        } else {
            " AND read_flag = FALSE"
        };

        let counts: Vec<(String, i64, i64)> = sqlx::query_as(&format!(
            "SELECT kind, COUNT(*), COUNT(*) FILTER (WHERE read_flag = FALSE) \
             FROM notifications \
             WHERE recipient_id = $1 AND (expires_at IS NULL OR expires_at > NOW()){read_predicate} \
             GROUP BY kind",
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count notification groups", e)
        })?;

        let latest = sqlx::query_as::<_, Notification>(&format!(
            "SELECT DISTINCT ON (kind) * FROM notifications \
             WHERE recipient_id = $1 AND (expires_at IS NULL OR expires_at > NOW()){read_predicate} \
             ORDER BY kind, created_at DESC, id DESC",
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to fetch latest per kind", e)
        })?;

        let mut summaries = Vec::with_capacity(latest.len());
        for notification in latest {
            let kind = notification.kind;
            let (total, unread_total) = counts
                .iter()
                .find(|(k, _, _)| k.parse::<NotificationKind>().ok() == Some(kind))
                .map(|(_, t, u)| (*t, *u))
                .unwrap_or((0, 0));
            summaries.push(KindSummary {
                kind,
                total,
                unread_total,
                latest: notification,
            });
        }
        // Most recently active group first.
        summaries.sort_by(|a, b| b.latest.created_at.cmp(&a.latest.created_at));
        summaries.truncate(limit.max(0) as usize);
        Ok(summaries)
    }

    async fn update_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
        read_flag: bool,
        max_attempts: u32,
    ) -> AppResult<Option<Notification>> {
        if read_flag {
            return sqlx::query_as::<_, Notification>(
                "UPDATE notifications \
                 SET read_flag = TRUE, read_at = COALESCE(read_at, NOW()), \
                     state = $3, updated_at = NOW() \
                 WHERE id = $1 AND recipient_id = $2 \
                 RETURNING *",
            )
            .bind(id)
            .bind(recipient_id)
            .bind(NotificationState::Read.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e));
        }

        // Marking unread leaves `read` and drops back to whatever state
        // the per-channel bookkeeping implies. The derivation runs on a
        // snapshot, so guard the write on the observed per-channel
        // document exactly like apply_delivery_outcome does; a
        // concurrent delivery writer invalidates the snapshot and we
        // re-derive against the fresh row.
        for _ in 0..CAS_MAX_RETRIES {
            let Some(current) = self.find_for_recipient(id, recipient_id).await? else {
                return Ok(None);
            };
            let observed = current.per_channel.0.clone();
            let state = derive_state(&observed, false, max_attempts);

            let updated = sqlx::query_as::<_, Notification>(
                "UPDATE notifications \
                 SET read_flag = FALSE, read_at = NULL, state = $4, updated_at = NOW() \
                 WHERE id = $1 AND recipient_id = $2 AND per_channel = $3 \
                 RETURNING *",
            )
            .bind(id)
            .bind(recipient_id)
            .bind(Json(&observed))
            .bind(state.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark unread", e)
            })?;

            if let Some(notification) = updated {
                return Ok(Some(notification));
            }
            warn!(%id, "Mark-unread lost a race with a delivery writer, retrying");
        }

        Err(AppError::database(format!(
            "Gave up marking {id} unread after {CAS_MAX_RETRIES} attempts"
        )))
    }

    async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        kind: Option<NotificationKind>,
    ) -> AppResult<u64> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "UPDATE notifications \
             SET read_flag = TRUE, read_at = COALESCE(read_at, NOW()), state = ",
        );
        builder.push_bind(NotificationState::Read.as_str());
        builder.push(", updated_at = NOW() WHERE read_flag = FALSE AND recipient_id = ");
        builder.push_bind(recipient_id);
        if let Some(kind) = kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn apply_delivery_outcome(
        &self,
        id: Uuid,
        channel: Channel,
        outcome: &DeliveryOutcome,
        max_attempts: u32,
    ) -> AppResult<Option<Notification>> {
        for _ in 0..CAS_MAX_RETRIES {
            let Some(current) = self.find_by_id(id).await? else {
                return Ok(None);
            };

            let observed = current.per_channel.0.clone();
            let mut next = observed.clone();
            let Some(cd) = next.get_mut(&channel) else {
                return Err(AppError::internal(format!(
                    "Channel {channel} was never requested for notification {id}"
                )));
            };
            cd.apply(outcome, Utc::now());

            let next_state = derive_state(&next, current.read_flag, max_attempts);
            let state = if current.state.can_transition(next_state) {
                next_state
            } else {
                current.state
            };

            // Compare-and-swap on the whole per-channel document: a row
            // touched by a concurrent writer fails the WHERE and we retry
            // against the fresh row.
            let updated = sqlx::query_as::<_, Notification>(
                "UPDATE notifications \
                 SET per_channel = $3, state = $4, updated_at = NOW() \
                 WHERE id = $1 AND per_channel = $2 \
                 RETURNING *",
            )
            .bind(id)
            .bind(Json(&observed))
            .bind(Json(&next))
            .bind(state.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to apply delivery outcome", e)
            })?;

            if let Some(notification) = updated {
                return Ok(Some(notification));
            }
            warn!(%id, %channel, "Per-channel update lost a race, retrying");
        }

        Err(AppError::database(format!(
            "Gave up applying delivery outcome for {id} after {CAS_MAX_RETRIES} attempts"
        )))
    }

    async fn delete(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete notification", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
        max_attempts: u32,
    ) -> AppResult<Vec<Notification>> {
        // `sent` records stay sweep-eligible: one channel succeeding
        // must not strand the others' retries. The EXISTS clause keeps
        // fully-dispatched records out of every pass.
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE state IN ('pending', 'sent') \
               AND (scheduled_at IS NULL OR scheduled_at <= $1) \
               AND (expires_at IS NULL OR expires_at > $1) \
               AND EXISTS ( \
                   SELECT 1 FROM jsonb_each(per_channel) AS pc \
                   WHERE (pc.value->>'enabled')::boolean \
                     AND NOT (pc.value->>'dispatched')::boolean \
                     AND NOT (pc.value->>'exhausted')::boolean \
                     AND COALESCE((pc.value->>'attempts')::int, 0) < $3) \
             ORDER BY created_at ASC \
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .bind(max_attempts as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to fetch due notifications", e)
        })
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to purge expired notifications", e)
        })?;
        Ok(result.rows_affected())
    }
}
