use crate::error::{Error, Result};
use crate::models::connection::{Connection, ConnectionStatus};
use crate::services::chat_service::ChatService;
use crate::services::referral_service::ReferralService;
use crate::services::user_service::UserService;
use crate::session::Session;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Seeker to giver connection requests and their PENDING -> ACCEPTED | REJECTED lifecycle.
#[derive(Clone)]
pub struct ConnectionService {
    pool: SqlitePool,
    users: UserService,
    referrals: ReferralService,
}

impl ConnectionService {
    pub fn new(pool: SqlitePool, users: UserService, referrals: ReferralService) -> Self {
        Self {
            pool,
            users,
            referrals,
        }
    }

    /// Opens a PENDING request from the session user to the referral's poster.
    pub async fn request_connection(&self, session: &Session, referral_id: Uuid) -> Result<Connection> {
        let requester = self.users.current_user(session).await?;
        let referral = self.referrals.get_referral(referral_id).await?;

        if self.find_for_requester(requester.id, referral_id).await?.is_some() {
            return Err(Error::Conflict(
                "A connection request for this referral already exists".to_string(),
            ));
        }

        let connection = Connection {
            id: Uuid::new_v4(),
            requester_id: requester.id,
            requester_name: requester.name,
            giver_id: referral.posted_by_user_id,
            giver_name: referral.posted_by_user_name,
            referral_id,
            referral_role: referral.role,
            status: ConnectionStatus::Pending,
            is_unread_by_giver: true,
            is_unread_by_seeker: false,
            requested_at: Utc::now(),
            responded_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO connections (
                id, requester_id, requester_name, giver_id, giver_name, referral_id, referral_role,
                status, is_unread_by_giver, is_unread_by_seeker, requested_at, responded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, 0, ?, NULL)
            "#,
        )
        .bind(connection.id)
        .bind(connection.requester_id)
        .bind(&connection.requester_name)
        .bind(connection.giver_id)
        .bind(&connection.giver_name)
        .bind(connection.referral_id)
        .bind(&connection.referral_role)
        .bind(connection.status)
        .bind(connection.requested_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return Error::Conflict(
                        "A connection request for this referral already exists".to_string(),
                    );
                }
            }
            Error::from(e)
        })?;

        tracing::info!(
            connection_id = %connection.id,
            requester_id = %connection.requester_id,
            giver_id = %connection.giver_id,
            referral_id = %referral_id,
            "Connection requested"
        );
        Ok(connection)
    }

    /// Accepts a PENDING request and makes sure the pair has a chat.
    ///
    /// Unknown or already answered connections are left untouched.
    pub async fn accept_connection(&self, connection_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if !answer_pending(&mut tx, connection_id, ConnectionStatus::Accepted).await? {
            return Ok(());
        }

        let Some(connection) = fetch_connection(&mut tx, connection_id).await? else {
            return Ok(());
        };
        let (chat, created) = ChatService::find_or_create_chat(
            &mut tx,
            (connection.requester_id, connection.requester_name.as_str()),
            (connection.giver_id, connection.giver_name.as_str()),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(connection_id = %connection_id, chat_id = %chat.id, chat_created = created, "Connection accepted");
        Ok(())
    }

    pub async fn reject_connection(&self, connection_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if !answer_pending(&mut tx, connection_id, ConnectionStatus::Rejected).await? {
            return Ok(());
        }

        tx.commit().await?;
        tracing::info!(connection_id = %connection_id, "Connection rejected");
        Ok(())
    }

    pub async fn get_connection(&self, connection_id: Uuid) -> Result<Option<Connection>> {
        let connection = sqlx::query_as::<_, Connection>(r#"SELECT * FROM connections WHERE id = ?"#)
            .bind(connection_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(connection)
    }

    pub async fn find_for_requester(&self, requester_id: Uuid, referral_id: Uuid) -> Result<Option<Connection>> {
        let connection = sqlx::query_as::<_, Connection>(
            r#"SELECT * FROM connections WHERE requester_id = ? AND referral_id = ?"#,
        )
        .bind(requester_id)
        .bind(referral_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(connection)
    }

    /// Every connection the session user is on either side of, newest first.
    pub async fn list_connections_for_user(&self, session: &Session) -> Result<Vec<Connection>> {
        let user_id = session.require_user()?;
        let connections = sqlx::query_as::<_, Connection>(
            r#"
            SELECT * FROM connections
            WHERE requester_id = ? OR giver_id = ?
            ORDER BY requested_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(connections)
    }

    pub async fn pending_requests_for_giver(&self, session: &Session) -> Result<Vec<Connection>> {
        let giver_id = session.require_user()?;
        let connections = sqlx::query_as::<_, Connection>(
            r#"
            SELECT * FROM connections
            WHERE giver_id = ? AND status = 'PENDING'
            ORDER BY requested_at DESC, rowid DESC
            "#,
        )
        .bind(giver_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(connections)
    }

    /// Badge count: PENDING requests the giver has not opened yet.
    pub async fn unread_count_for_giver(&self, session: &Session) -> Result<i64> {
        let giver_id = session.require_user()?;
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM connections
            WHERE giver_id = ? AND status = 'PENDING' AND is_unread_by_giver = 1
            "#,
        )
        .bind(giver_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn mark_connections_read_for_giver(&self, session: &Session) -> Result<u64> {
        let giver_id = session.require_user()?;
        let result = sqlx::query(
            r#"UPDATE connections SET is_unread_by_giver = 0 WHERE giver_id = ? AND is_unread_by_giver = 1"#,
        )
        .bind(giver_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_connections_read_for_seeker(&self, session: &Session) -> Result<u64> {
        let requester_id = session.require_user()?;
        let result = sqlx::query(
            r#"UPDATE connections SET is_unread_by_seeker = 0 WHERE requester_id = ? AND is_unread_by_seeker = 1"#,
        )
        .bind(requester_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Requests made against one referral, oldest first.
    pub async fn applicants_for_referral(&self, referral_id: Uuid) -> Result<Vec<Connection>> {
        let connections = sqlx::query_as::<_, Connection>(
            r#"
            SELECT * FROM connections
            WHERE referral_id = ?
            ORDER BY requested_at ASC, rowid ASC
            "#,
        )
        .bind(referral_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(connections)
    }
}

async fn fetch_connection(
    conn: &mut sqlx::SqliteConnection,
    connection_id: Uuid,
) -> Result<Option<Connection>> {
    let connection = sqlx::query_as::<_, Connection>(r#"SELECT * FROM connections WHERE id = ?"#)
        .bind(connection_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(connection)
}

/// Moves a PENDING connection to `status` as the transaction's first statement,
/// so the write lock is taken before anything is read. `false` means nothing
/// changed: the connection is missing or already answered.
async fn answer_pending(
    conn: &mut sqlx::SqliteConnection,
    connection_id: Uuid,
    status: ConnectionStatus,
) -> Result<bool> {
    let updated = sqlx::query(
        r#"
        UPDATE connections
        SET status = ?, is_unread_by_seeker = 1, responded_at = ?
        WHERE id = ? AND status = 'PENDING'
        "#,
    )
    .bind(status)
    .bind(Utc::now())
    .bind(connection_id)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() > 0 {
        return Ok(true);
    }

    match fetch_connection(&mut *conn, connection_id).await? {
        None => {
            tracing::warn!(connection_id = %connection_id, requested = ?status, "Answer on missing connection; ignored")
        }
        Some(existing) => {
            tracing::warn!(connection_id = %connection_id, status = ?existing.status, requested = ?status, "Answer on already answered connection; ignored")
        }
    }
    Ok(false)
}
