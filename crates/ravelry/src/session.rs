use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials for the linked Ravelry account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub account: String,
}

impl Session {
    /// Sessions without an expiry never expire on the client side.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("account", &self.account)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            access_token: "t1".to_string(),
            refresh_token: Some("r1".to_string()),
            expires_at,
            account: "knitter".to_string(),
        }
    }

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        assert!(session(Some(now)).is_expired_at(now));
        assert!(!session(Some(now + Duration::seconds(1))).is_expired_at(now));
        assert!(!session(None).is_expired_at(now));
    }

    #[test]
    fn debug_hides_tokens() {
        let debug = format!("{:?}", session(None));
        assert!(!debug.contains("t1"));
        assert!(!debug.contains("r1"));
        assert!(debug.contains("knitter"));
    }
}
