//! Password gate and usage counter for the text-summary feature.
//!
//! State is an explicit value: every handler receives a [`SessionState`] and
//! returns the next one, so nothing is shared between requests.

use crate::error::{ConfigError, SessionError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub authenticated: bool,
    pub uses_remaining: u32,
}

impl SessionState {
    pub fn can_use(&self) -> bool {
        self.authenticated && self.uses_remaining > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_uses: u32,
    /// Environment variable holding the gate password.
    pub password_env: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_uses: 3,
            password_env: "ANALYSIS_PASSWORD".into(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.password_env.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.password_env must name an environment variable".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SessionGate {
    password: String,
    max_uses: u32,
}

impl SessionGate {
    pub fn new(password: impl Into<String>, max_uses: u32) -> Self {
        Self {
            password: password.into(),
            max_uses,
        }
    }

    /// A fresh, locked session with the full allowance.
    pub fn open(&self) -> SessionState {
        SessionState {
            authenticated: false,
            uses_remaining: self.max_uses,
        }
    }

    pub fn authenticate(
        &self,
        state: SessionState,
        attempt: &str,
    ) -> Result<SessionState, SessionError> {
        if attempt != self.password {
            return Err(SessionError::InvalidPassword);
        }
        Ok(SessionState {
            authenticated: true,
            ..state
        })
    }

    /// Spend one use of the gated feature.
    pub fn consume(&self, state: SessionState) -> Result<SessionState, SessionError> {
        if !state.authenticated {
            return Err(SessionError::NotAuthenticated);
        }
        if state.uses_remaining == 0 {
            return Err(SessionError::UsageExhausted {
                max_uses: self.max_uses,
            });
        }
        Ok(SessionState {
            uses_remaining: state.uses_remaining - 1,
            ..state
        })
    }

    pub fn reset(&self, state: SessionState) -> SessionState {
        SessionState {
            uses_remaining: self.max_uses,
            ..state
        }
    }
}
