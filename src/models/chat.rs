use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Which participant column of a chat row a user occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantSlot {
    User1,
    User2,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Chat {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user1_name: String,
    pub user2_id: Uuid,
    pub user2_name: String,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count_user1: i64,
    pub unread_count_user2: i64,
}

impl Chat {
    pub fn slot_of(&self, user_id: Uuid) -> Option<ParticipantSlot> {
        if self.user1_id == user_id {
            Some(ParticipantSlot::User1)
        } else if self.user2_id == user_id {
            Some(ParticipantSlot::User2)
        } else {
            None
        }
    }

    pub fn has_participants(&self, a: Uuid, b: Uuid) -> bool {
        (self.user1_id == a && self.user2_id == b) || (self.user1_id == b && self.user2_id == a)
    }

    pub fn unread_count_for(&self, user_id: Uuid) -> i64 {
        match self.slot_of(user_id) {
            Some(ParticipantSlot::User1) => self.unread_count_user1,
            Some(ParticipantSlot::User2) => self.unread_count_user2,
            None => 0,
        }
    }

    /// The participant that is not `user_id`, as (id, name).
    pub fn counterpart_of(&self, user_id: Uuid) -> Option<(Uuid, &str)> {
        match self.slot_of(user_id)? {
            ParticipantSlot::User1 => Some((self.user2_id, self.user2_name.as_str())),
            ParticipantSlot::User2 => Some((self.user1_id, self.user1_name.as_str())),
        }
    }
}
