//! Streamer configuration.

use fieldstream_autoclose::AutoCloseConfig;
use serde::{Deserialize, Serialize};

/// Options of a [`Streamer`](crate::Streamer).
///
/// Derives serde so it can be embedded in an application's own config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Configuration handed to every auto-closing stream
    pub auto_close: AutoCloseConfig,
    /// Mark every stream and pipeline parallel from the start
    pub parallel: bool,
}

impl StreamerConfig {
    /// Sequential streams, escape hatch disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the auto-close configuration.
    pub fn with_auto_close(mut self, auto_close: AutoCloseConfig) -> Self {
        self.auto_close = auto_close;
        self
    }

    /// Permits or refuses raw cursor escape.
    pub fn with_iterator_escape(mut self, allow: bool) -> Self {
        self.auto_close = self.auto_close.with_iterator_escape(allow);
        self
    }

    /// Sets whether streams start parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Default configuration with the escape flag read from the
    /// environment (see [`AutoCloseConfig::from_env`]).
    pub fn from_env() -> Self {
        Self::new().with_auto_close(AutoCloseConfig::from_env())
    }
}
