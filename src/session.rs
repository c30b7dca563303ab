//! Explicit per-request user session.
//!
//! Every core operation receives the caller's `Session` instead of reading a
//! process-wide "current user". Whoever owns the session decides its
//! lifecycle: `login` sets the user, `logout` clears it.

use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<Uuid>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn login(&mut self, user_id: Uuid) {
        self.user_id = Some(user_id);
    }

    pub fn logout(&mut self) {
        self.user_id = None;
    }

    pub fn current_user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn require_user(&self) -> Result<Uuid> {
        self.user_id.ok_or(Error::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_and_logout_drive_current_user() {
        let mut session = Session::anonymous();
        assert!(!session.is_logged_in());
        assert!(matches!(session.require_user(), Err(Error::NotAuthenticated)));

        let id = Uuid::new_v4();
        session.login(id);
        assert_eq!(session.current_user_id(), Some(id));
        assert_eq!(session.require_user().unwrap(), id);

        session.logout();
        assert_eq!(session.current_user_id(), None);
        assert!(matches!(session.require_user(), Err(Error::NotAuthenticated)));
    }
}
