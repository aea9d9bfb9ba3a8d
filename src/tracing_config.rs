//! Tracing configuration for session operations.
//!
//! [`TracingConfig`] controls which session operations emit tracing spans,
//! whether per-operation elapsed-time events are recorded, and whether
//! request and reply payloads are dumped at `DEBUG` level.

use tracing::Level;

/// Controls tracing span levels, per-operation timing and payload dumps.
///
/// By default, lifecycle operations (`connect`, `disconnect`) emit spans at
/// `INFO` level and command operations (`call`, `call_async`) at `DEBUG`
/// level. Timing and payload dumps are disabled by default.
///
/// Spans are always created at the configured level. When no `tracing`
/// subscriber is installed, span creation is a no-op. When timing is enabled
/// for an operation, an additional event recording `elapsed_us` is emitted
/// when the operation completes.
///
/// # Examples
///
/// ```
/// use rpcframe::TracingConfig;
/// use tracing::Level;
///
/// // Dump every synchronous command and its reply.
/// let config = TracingConfig::default().with_log_commands(true);
/// let _ = config;
///
/// // Everything at TRACE, with timing.
/// let verbose = TracingConfig::default()
///     .with_all_levels(Level::TRACE)
///     .with_all_timing(true);
/// let _ = verbose;
/// ```
#[expect(
    clippy::struct_excessive_bools,
    reason = "independent on/off switches, one per operation or payload kind"
)]
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub(crate) connect_level: Level,
    pub(crate) call_level: Level,
    pub(crate) call_async_level: Level,
    pub(crate) disconnect_level: Level,
    pub(crate) connect_timing: bool,
    pub(crate) call_timing: bool,
    pub(crate) disconnect_timing: bool,
    pub(crate) log_commands: bool,
    pub(crate) log_async_commands: bool,
    pub(crate) log_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            connect_level: Level::INFO,
            call_level: Level::DEBUG,
            call_async_level: Level::DEBUG,
            disconnect_level: Level::INFO,
            connect_timing: false,
            call_timing: false,
            disconnect_timing: false,
            log_commands: false,
            log_async_commands: false,
            log_events: false,
        }
    }
}

impl TracingConfig {
    /// Set the tracing level for the `connect` operation.
    ///
    /// # Examples
    ///
    /// ```
    /// use rpcframe::TracingConfig;
    /// use tracing::Level;
    ///
    /// let config = TracingConfig::default().with_connect_level(Level::TRACE);
    /// let _ = config;
    /// ```
    #[must_use]
    pub fn with_connect_level(mut self, level: Level) -> Self {
        self.connect_level = level;
        self
    }

    /// Enable or disable timing for the `connect` operation.
    ///
    /// When enabled, an event recording `elapsed_us` is emitted at `DEBUG`
    /// level once the handshake completes or fails.
    #[must_use]
    pub fn with_connect_timing(mut self, enabled: bool) -> Self {
        self.connect_timing = enabled;
        self
    }

    /// Set the tracing level for synchronous calls.
    #[must_use]
    pub fn with_call_level(mut self, level: Level) -> Self {
        self.call_level = level;
        self
    }

    /// Enable or disable timing for synchronous calls.
    #[must_use]
    pub fn with_call_timing(mut self, enabled: bool) -> Self {
        self.call_timing = enabled;
        self
    }

    /// Set the tracing level for asynchronous calls.
    #[must_use]
    pub fn with_call_async_level(mut self, level: Level) -> Self {
        self.call_async_level = level;
        self
    }

    /// Set the tracing level for the `disconnect` operation.
    #[must_use]
    pub fn with_disconnect_level(mut self, level: Level) -> Self {
        self.disconnect_level = level;
        self
    }

    /// Enable or disable timing for the `disconnect` operation.
    #[must_use]
    pub fn with_disconnect_timing(mut self, enabled: bool) -> Self {
        self.disconnect_timing = enabled;
        self
    }

    /// Dump synchronous requests and their replies.
    #[must_use]
    pub fn with_log_commands(mut self, enabled: bool) -> Self {
        self.log_commands = enabled;
        self
    }

    /// Dump asynchronous requests and their replies.
    #[must_use]
    pub fn with_log_async_commands(mut self, enabled: bool) -> Self {
        self.log_async_commands = enabled;
        self
    }

    /// Dump every inbound event payload.
    #[must_use]
    pub fn with_log_events(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    /// Set the tracing level for all operations at once.
    #[must_use]
    pub fn with_all_levels(mut self, level: Level) -> Self {
        self.connect_level = level;
        self.call_level = level;
        self.call_async_level = level;
        self.disconnect_level = level;
        self
    }

    /// Enable or disable timing for all operations at once.
    #[must_use]
    pub fn with_all_timing(mut self, enabled: bool) -> Self {
        self.connect_timing = enabled;
        self.call_timing = enabled;
        self.disconnect_timing = enabled;
        self
    }
}
