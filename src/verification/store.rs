/// SQLite-backed verification request store
use crate::{
    error::{KlikError, KlikResult},
    metrics,
    verification::{
        models::{Profile, ReviewDecision, VerificationRequest, VerificationStatus},
        source::{ChangeEvent, ChangeFeed, ChangeKind, RecordSource, Subscription},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

const SELECT_REQUESTS: &str = r#"
    SELECT v.id, v.user_id, v.document_url, v.status, v.created_at,
           v.reviewed_by, v.reviewed_at,
           p.user_id AS profile_user_id, p.full_name, p.phone
    FROM verification_request v
    LEFT JOIN profile p ON p.user_id = v.user_id
"#;

/// Verification request store
///
/// Every write publishes a notification on the store's change feed.
#[derive(Clone)]
pub struct VerificationStore {
    db: SqlitePool,
    feed: ChangeFeed,
}

impl VerificationStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            feed: ChangeFeed::new(),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn publish(&self, kind: ChangeKind, request_id: &str) {
        metrics::record_change_event(kind.as_str());
        let receivers = self.feed.publish(ChangeEvent {
            kind,
            request_id: request_id.to_string(),
        });
        debug!(kind = kind.as_str(), request_id, receivers, "change published");
    }

    /// Submit a verification request
    ///
    /// Returns `None` when the user already has a pending request.
    pub async fn submit(
        &self,
        user_id: &str,
        document_url: &str,
    ) -> KlikResult<Option<VerificationRequest>> {
        let user_id = user_id.trim();
        let document_url = document_url.trim();

        if user_id.is_empty() {
            return Err(KlikError::Validation("user_id is required".to_string()));
        }
        if document_url.is_empty() {
            return Err(KlikError::Validation("document_url is required".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        // The partial unique index on pending rows makes the insert a no-op
        // when the user already has one, even under concurrent submissions
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO verification_request (id, user_id, document_url, status, created_at)
            VALUES (?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(document_url)
        .bind(now.to_rfc3339())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            info!(user_id, "verification already pending, submission ignored");
            return Ok(None);
        }

        metrics::record_review_action("submit");
        self.publish(ChangeKind::Insert, &id);

        self.get(&id)
            .await?
            .map(Some)
            .ok_or_else(|| KlikError::Internal(format!("Request {} vanished after insert", id)))
    }

    /// Approve or reject a pending request
    pub async fn review(
        &self,
        request_id: &str,
        decision: ReviewDecision,
        reviewed_by: &str,
    ) -> KlikResult<VerificationRequest> {
        if reviewed_by.trim().is_empty() {
            return Err(KlikError::Validation("reviewed_by is required".to_string()));
        }

        let now = Utc::now();
        let status = decision.status();

        let result = sqlx::query(
            r#"
            UPDATE verification_request
            SET status = ?,
                reviewed_by = ?,
                reviewed_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(reviewed_by.trim())
        .bind(now.to_rfc3339())
        .bind(request_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get(request_id).await? {
                Some(existing) => Err(KlikError::Conflict(format!(
                    "Request {} is already {}",
                    request_id,
                    existing.status.as_str()
                ))),
                None => Err(KlikError::NotFound(format!("Request {} not found", request_id))),
            };
        }

        info!(request_id, status = status.as_str(), reviewed_by, "verification reviewed");
        metrics::record_review_action(status.as_str());
        self.publish(ChangeKind::Update, request_id);

        self.get(request_id)
            .await?
            .ok_or_else(|| KlikError::NotFound(format!("Request {} not found", request_id)))
    }

    /// Remove a request
    pub async fn delete(&self, request_id: &str) -> KlikResult<()> {
        let result = sqlx::query("DELETE FROM verification_request WHERE id = ?")
            .bind(request_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(KlikError::NotFound(format!("Request {} not found", request_id)));
        }

        metrics::record_review_action("delete");
        self.publish(ChangeKind::Delete, request_id);
        Ok(())
    }

    /// Insert or replace the joined profile of a user
    ///
    /// Requests owned by the user are announced as updated, since their
    /// joined view changed.
    pub async fn upsert_profile(
        &self,
        user_id: &str,
        full_name: Option<&str>,
        phone: Option<&str>,
    ) -> KlikResult<()> {
        if user_id.trim().is_empty() {
            return Err(KlikError::Validation("user_id is required".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO profile (user_id, full_name, phone, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                full_name = excluded.full_name,
                phone = excluded.phone,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(phone)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;

        let ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM verification_request WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.db)
                .await?;

        for id in ids {
            self.publish(ChangeKind::Update, &id);
        }

        Ok(())
    }

    /// Get request by ID
    pub async fn get(&self, request_id: &str) -> KlikResult<Option<VerificationRequest>> {
        let row = sqlx::query(&format!("{} WHERE v.id = ?", SELECT_REQUESTS))
            .bind(request_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_request).transpose()
    }

    /// All requests, newest first
    pub async fn list(&self) -> KlikResult<Vec<VerificationRequest>> {
        let rows = sqlx::query(&format!("{} ORDER BY v.created_at DESC", SELECT_REQUESTS))
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(parse_request).collect()
    }
}

fn parse_timestamp(raw: &str) -> KlikResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KlikError::Internal(format!("Invalid timestamp {:?}: {}", raw, e)))
}

fn parse_request(row: sqlx::sqlite::SqliteRow) -> KlikResult<VerificationRequest> {
    let id: String = row.try_get("id")?;

    let status = VerificationStatus::parse(&row.try_get::<String, _>("status")?);
    if !status.is_known() {
        warn!(request_id = %id, status = status.as_str(), "unrecognized verification status");
    }

    let created_at = parse_timestamp(&row.try_get::<String, _>("created_at")?)?;
    let reviewed_at = row
        .try_get::<Option<String>, _>("reviewed_at")?
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    let profile = match row.try_get::<Option<String>, _>("profile_user_id")? {
        Some(_) => Some(Profile {
            full_name: row.try_get("full_name")?,
            phone: row.try_get("phone")?,
        }),
        None => None,
    };

    Ok(VerificationRequest {
        id,
        user_id: row.try_get("user_id")?,
        status,
        created_at,
        document_url: row.try_get("document_url")?,
        reviewed_by: row.try_get("reviewed_by")?,
        reviewed_at,
        profile,
    })
}

#[async_trait]
impl RecordSource for VerificationStore {
    async fn fetch_all(&self) -> KlikResult<Vec<VerificationRequest>> {
        self.list()
            .await
            .map_err(|e| KlikError::Fetch(e.to_string()))
    }

    fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }

    async fn create(&self, user_id: &str, document_url: &str) -> KlikResult<bool> {
        Ok(self.submit(user_id, document_url).await?.is_some())
    }
}
