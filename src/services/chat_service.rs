use crate::error::Result;
use crate::models::chat::Chat;
use crate::models::message::Message;
use crate::services::user_service::UserService;
use crate::session::Session;
use chrono::Utc;
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatService {
    pool: SqlitePool,
    users: UserService,
}

impl ChatService {
    pub fn new(pool: SqlitePool, users: UserService) -> Self {
        Self { pool, users }
    }

    /// Looks the pair up in either participant order before creating a chat.
    /// Returns the chat and whether it was newly created.
    ///
    /// Callers must already hold the write lock on `conn` so that two accepts
    /// for the same pair cannot both miss the lookup.
    pub(crate) async fn find_or_create_chat(
        conn: &mut SqliteConnection,
        (user1_id, user1_name): (Uuid, &str),
        (user2_id, user2_name): (Uuid, &str),
    ) -> Result<(Chat, bool)> {
        if let Some(chat) = find_chat_by_pair(&mut *conn, user1_id, user2_id).await? {
            return Ok((chat, false));
        }

        let chat = Chat {
            id: Uuid::new_v4(),
            user1_id,
            user1_name: user1_name.to_string(),
            user2_id,
            user2_name: user2_name.to_string(),
            last_message: String::new(),
            last_message_time: Utc::now(),
            unread_count_user1: 0,
            unread_count_user2: 0,
        };

        sqlx::query(
            r#"
            INSERT INTO chats (
                id, user1_id, user1_name, user2_id, user2_name,
                last_message, last_message_time, unread_count_user1, unread_count_user2
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0)
            "#,
        )
        .bind(chat.id)
        .bind(chat.user1_id)
        .bind(&chat.user1_name)
        .bind(chat.user2_id)
        .bind(&chat.user2_name)
        .bind(&chat.last_message)
        .bind(chat.last_message_time)
        .execute(&mut *conn)
        .await?;

        Ok((chat, true))
    }

    pub async fn get_chat(&self, chat_id: Uuid) -> Result<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(r#"SELECT * FROM chats WHERE id = ?"#)
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(chat)
    }

    pub async fn get_chat_by_users(&self, a: Uuid, b: Uuid) -> Result<Option<Chat>> {
        find_chat_by_pair(&self.pool, a, b).await
    }

    pub async fn list_chats_for_user(&self, session: &Session) -> Result<Vec<Chat>> {
        let user_id = session.require_user()?;
        let chats = sqlx::query_as::<_, Chat>(
            r#"
            SELECT * FROM chats
            WHERE user1_id = ? OR user2_id = ?
            ORDER BY last_message_time DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(chats)
    }

    pub async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE chat_id = ?
            ORDER BY sent_at ASC, rowid ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    /// Appends a message and bumps the recipient's unread counter.
    ///
    /// Missing session, unknown chat or a sender outside the chat are
    /// logged no-ops and yield `Ok(None)`.
    pub async fn send_message(
        &self,
        session: &Session,
        chat_id: Uuid,
        content: &str,
    ) -> Result<Option<Message>> {
        let Some(sender_id) = session.current_user_id() else {
            tracing::warn!(chat_id = %chat_id, "send_message without a session; ignored");
            return Ok(None);
        };
        let Some(sender) = self.users.get_by_id(sender_id).await? else {
            tracing::warn!(chat_id = %chat_id, sender_id = %sender_id, "send_message from unknown user; ignored");
            return Ok(None);
        };

        let message = Message {
            id: Uuid::new_v4(),
            chat_id,
            sender_id,
            sender_name: sender.name,
            content: content.to_string(),
            sent_at: Utc::now(),
            is_read: false,
        };

        // Write before any read: a deferred transaction that has already read
        // cannot wait for the write lock. The WHERE doubles as the participant check.
        let mut tx = self.pool.begin().await?;
        let bumped = sqlx::query(
            r#"
            UPDATE chats
            SET last_message = ?,
                last_message_time = ?,
                unread_count_user1 = unread_count_user1 + CASE WHEN user1_id = ? THEN 0 ELSE 1 END,
                unread_count_user2 = unread_count_user2 + CASE WHEN user1_id = ? THEN 1 ELSE 0 END
            WHERE id = ? AND (user1_id = ? OR user2_id = ?)
            "#,
        )
        .bind(&message.content)
        .bind(message.sent_at)
        .bind(sender_id)
        .bind(sender_id)
        .bind(chat_id)
        .bind(sender_id)
        .bind(sender_id)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            let exists: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM chats WHERE id = ?"#)
                .bind(chat_id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                tracing::warn!(chat_id = %chat_id, "send_message to missing chat; ignored");
            } else {
                tracing::warn!(chat_id = %chat_id, sender_id = %sender_id, "Sender is not a chat participant; ignored");
            }
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO messages (id, chat_id, sender_id, sender_name, content, sent_at, is_read)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(message.id)
        .bind(message.chat_id)
        .bind(message.sender_id)
        .bind(&message.sender_name)
        .bind(&message.content)
        .bind(message.sent_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(chat_id = %chat_id, message_id = %message.id, "Message sent");
        Ok(Some(message))
    }

    /// Zeroes the reader's unread counter and marks the other side's messages read.
    pub async fn mark_chat_as_read(&self, session: &Session, chat_id: Uuid) -> Result<()> {
        let Some(user_id) = session.current_user_id() else {
            tracing::warn!(chat_id = %chat_id, "mark_chat_as_read without a session; ignored");
            return Ok(());
        };

        let mut tx = self.pool.begin().await?;
        let cleared = sqlx::query(
            r#"
            UPDATE chats
            SET unread_count_user1 = CASE WHEN user1_id = ? THEN 0 ELSE unread_count_user1 END,
                unread_count_user2 = CASE WHEN user1_id = ? THEN unread_count_user2 ELSE 0 END
            WHERE id = ? AND (user1_id = ? OR user2_id = ?)
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(chat_id)
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if cleared.rows_affected() == 0 {
            tracing::warn!(chat_id = %chat_id, user_id = %user_id, "mark_chat_as_read by non-participant or on missing chat; ignored");
            return Ok(());
        }

        sqlx::query(r#"UPDATE messages SET is_read = 1 WHERE chat_id = ? AND sender_id != ?"#)
            .bind(chat_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn total_unread_messages(&self, session: &Session) -> Result<i64> {
        let user_id = session.require_user()?;
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE WHEN user1_id = ? THEN unread_count_user1 ELSE unread_count_user2 END), 0)
            FROM chats
            WHERE user1_id = ? OR user2_id = ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}

/// The chat between `a` and `b`, whichever participant slot each one holds.
async fn find_chat_by_pair<'e, E>(executor: E, a: Uuid, b: Uuid) -> Result<Option<Chat>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let chat = sqlx::query_as::<_, Chat>(
        r#"
        SELECT * FROM chats
        WHERE (user1_id = ? AND user2_id = ?) OR (user1_id = ? AND user2_id = ?)
        ORDER BY rowid ASC
        LIMIT 1
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_optional(executor)
    .await?;
    Ok(chat)
}
