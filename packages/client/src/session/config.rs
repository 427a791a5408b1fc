//! Session configuration

use std::time::Duration;

use crate::domain::{BaseTopic, Role};

/// Display name used when none is configured
pub const DEFAULT_USERNAME: &str = "User";

/// Fixed delay before a reconnect attempt
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Limit for a single connect attempt
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between keepalive pings on the broker link
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(30);

/// Configuration of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub role: Role,
    pub base_topic: BaseTopic,
    pub username: String,
    pub reconnect_backoff: Duration,
    /// A connect attempt still pending after this long counts as failed
    pub connect_timeout: Duration,
    /// Ping interval for links that support it; `None` disables keepalive
    pub keepalive: Option<Duration>,
    /// Broadcaster only: answer `get_current_question` requests
    pub respond_to_resync: bool,
    /// Ask for the current question every time the session becomes synced
    pub resync_on_connect: bool,
}

impl SessionConfig {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            base_topic: BaseTopic::default(),
            username: DEFAULT_USERNAME.to_string(),
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            keepalive: Some(DEFAULT_KEEPALIVE),
            respond_to_resync: true,
            resync_on_connect: true,
        }
    }

    pub fn broadcaster() -> Self {
        Self::new(Role::Broadcaster)
    }

    pub fn participant() -> Self {
        Self::new(Role::Participant)
    }

    pub fn with_base_topic(mut self, base_topic: BaseTopic) -> Self {
        self.base_topic = base_topic;
        self
    }

    /// Set the display name. A blank name falls back to [`DEFAULT_USERNAME`].
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        let trimmed = username.trim();
        self.username = if trimmed.is_empty() {
            DEFAULT_USERNAME.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn with_respond_to_resync(mut self, enabled: bool) -> Self {
        self.respond_to_resync = enabled;
        self
    }

    pub fn with_resync_on_connect(mut self, enabled: bool) -> Self {
        self.resync_on_connect = enabled;
        self
    }

    /// Whether this session answers resync requests
    pub fn answers_resync(&self) -> bool {
        self.role == Role::Broadcaster && self.respond_to_resync
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::participant()
    }
}
