//! Server-side session records.
//!
//! Sessions are keyed by a random id delivered in a cookie; each record
//! carries the CSRF token issued at login. A session dies once its age
//! exceeds the absolute ceiling regardless of refresh activity.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;

/// Absolute session lifetime: 30 days from creation.
pub const SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session_id: String,
    pub csrf_token: String,
    pub created_at: i64,
    pub last_access: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl SessionRecord {
    pub fn is_live(&self, now: i64) -> bool {
        now - self.created_at <= SESSION_MAX_AGE_SECS
    }
}

/// Generate a 32-byte random token, hex-encoded (session ids and CSRF
/// tokens).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Session persistence seam. Injected into the request handlers so the
/// in-memory implementation can be swapped for an external store without
/// touching the auth flow.
pub trait SessionStore: Send + Sync {
    /// Fetch a live session. Sessions past their absolute lifetime are
    /// treated as absent.
    fn get(&self, session_id: &str) -> Option<SessionRecord>;
    fn put(&self, record: SessionRecord);
    /// Update last-access bookkeeping for a live session.
    fn touch(&self, session_id: &str, ip: Option<String>, user_agent: Option<String>);
    fn delete(&self, session_id: &str);
    /// Drop expired sessions. Run opportunistically on request handling.
    fn sweep(&self);
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    fn now() -> i64 {
        Utc::now().timestamp()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> Option<SessionRecord> {
        let now = Self::now();
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(session_id) {
            Some(record) if record.is_live(now) => Some(record.clone()),
            Some(_) => {
                sessions.remove(session_id);
                None
            }
            None => None,
        }
    }

    fn put(&self, record: SessionRecord) {
        self.sessions
            .lock()
            .unwrap()
            .insert(record.session_id.clone(), record);
    }

    fn touch(&self, session_id: &str, ip: Option<String>, user_agent: Option<String>) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(record) = sessions.get_mut(session_id) {
            record.last_access = Self::now();
            if ip.is_some() {
                record.ip = ip;
            }
            if user_agent.is_some() {
                record.user_agent = user_agent;
            }
        }
    }

    fn delete(&self, session_id: &str) {
        self.sessions.lock().unwrap().remove(session_id);
    }

    fn sweep(&self) {
        let now = Self::now();
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, record| record.is_live(now));
    }
}
