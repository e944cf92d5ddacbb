use std::fmt;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl ToastLevel {
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Success => "✔",
            Self::Error => "✖",
            Self::Warning => "⚠",
            Self::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.level.icon(), self.title, self.message)
    }
}

/// Short-lived notifications written to a terminal sink.
///
/// Shown toasts stay listed in [`ToastManager::active`] until their duration elapses.
pub struct ToastManager {
    sink: Mutex<Box<dyn Write + Send>>,
    active: Mutex<Vec<Toast>>,
    default_duration: Duration,
}

impl fmt::Debug for ToastManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastManager")
            .field("active", &self.active)
            .field("default_duration", &self.default_duration)
            .finish_non_exhaustive()
    }
}

impl ToastManager {
    #[must_use]
    pub fn new(default_duration: Duration, sink: Box<dyn Write + Send>) -> Self {
        Self { sink: Mutex::new(sink), active: Mutex::new(Vec::new()), default_duration }
    }

    /// A manager that keeps toasts in memory only.
    #[must_use]
    pub fn silent(default_duration: Duration) -> Self {
        Self::new(default_duration, Box::new(std::io::sink()))
    }

    pub fn show(&self, title: &str, message: &str, level: ToastLevel) {
        self.show_for(title, message, level, self.default_duration);
    }

    pub fn success(&self, title: &str, message: &str) {
        self.show(title, message, ToastLevel::Success);
    }

    pub fn error(&self, title: &str, message: &str) {
        self.show(title, message, ToastLevel::Error);
    }

    pub fn show_for(&self, title: &str, message: &str, level: ToastLevel, duration: Duration) {
        let now = Instant::now();
        let toast = Toast {
            title: title.to_string(),
            message: message.to_string(),
            level,
            expires_at: now + duration,
        };

        match level {
            ToastLevel::Error => tracing::warn!(title, message, "toast"),
            _ => tracing::debug!(title, message, level = ?level, "toast"),
        }

        {
            let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = writeln!(sink, "{toast}") {
                tracing::debug!(error = %e, "Failed to write toast");
            }
        }

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|t| t.expires_at > now);
        active.push(toast);
    }

    /// Toasts whose duration has not elapsed yet, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|t| t.expires_at > now);
        active.clone()
    }
}
