use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// PENDING is the only initial state; ACCEPTED and REJECTED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ConnectionStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Connection {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub giver_id: Uuid,
    pub giver_name: String,
    pub referral_id: Uuid,
    pub referral_role: String,
    pub status: ConnectionStatus,
    pub is_unread_by_giver: bool,
    pub is_unread_by_seeker: bool,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_is_open() {
        assert!(!ConnectionStatus::Pending.is_terminal());
        assert!(ConnectionStatus::Accepted.is_terminal());
        assert!(ConnectionStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&ConnectionStatus::Accepted).unwrap();
        assert_eq!(json, "\"ACCEPTED\"");
    }
}
