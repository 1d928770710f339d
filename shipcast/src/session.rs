//! Per-session forecast cache
//!
//! The dashboard keeps one forecast per user session so that evaluation can
//! run after forecasting. The cache is an explicit value passed to the
//! pipeline; nothing here is global.

use crate::models::{Forecast, ModelKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a user session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The last forecast a session produced
#[derive(Debug, Clone, PartialEq)]
pub struct CachedForecast {
    /// Model that produced the forecast
    pub model: ModelKind,
    /// The forecast itself
    pub forecast: Forecast,
}

/// Latest forecast per session
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: HashMap<SessionId, CachedForecast>,
}

impl SessionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a forecast, replacing the session's previous one
    pub fn store(&mut self, session: SessionId, forecast: Forecast) {
        let model = forecast.model();
        self.entries.insert(session, CachedForecast { model, forecast });
    }

    /// The session's latest forecast
    pub fn get(&self, session: &SessionId) -> Option<&CachedForecast> {
        self.entries.get(session)
    }

    /// Drop the session's forecast
    pub fn invalidate(&mut self, session: &SessionId) -> Option<CachedForecast> {
        self.entries.remove(session)
    }

    /// Number of sessions with a cached forecast
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no session has a forecast
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
