//! # Session registry
//!
//! In-memory map from opaque bearer token to the admin session behind it.
//! Token set membership is the entire authorization model: no roles, no
//! scoping, no expiry. Sessions exist from login until logout or process
//! exit and are never persisted.
use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use rand::RngCore;

pub struct Session {
    pub username: String,
    pub created_at: i64,
}

pub struct SessionRegistry {
    admin_user: String,
    admin_pass: String,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new(admin_user: String, admin_pass: String) -> Self {
        Self {
            admin_user,
            admin_pass,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Checks the single configured credential pair and, on match, mints a
    /// 256-bit random token and records the session behind it.
    pub fn login(&self, username: &str, password: &str) -> Option<String> {
        if username != self.admin_user || password != self.admin_pass {
            return None;
        }

        let token = mint_token();
        self.sessions.lock().insert(
            token.clone(),
            Session {
                username: username.to_string(),
                created_at: Utc::now().timestamp_millis(),
            },
        );

        Some(token)
    }

    /// Removes the session if present. Unknown tokens are a no-op.
    pub fn logout(&self, token: &str) {
        self.sessions.lock().remove(token);
    }

    pub fn authorize(&self, token: &str) -> bool {
        self.sessions.lock().contains_key(token)
    }
}

fn mint_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
