//! User-visible notifications.

use std::fmt;

use chrono::{DateTime, Utc};

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AlertLevel::Success => "success",
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Danger => "danger",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({})",
            self.level,
            self.message,
            self.raised_at.format("%H:%M:%S")
        )
    }
}

/// Ordered list of alerts, oldest first.
///
/// Alerts stay until dismissed by position, which is how an operator
/// closes them one at a time.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    alerts: Vec<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an alert and return it.
    pub fn push(&mut self, level: AlertLevel, message: impl Into<String>) -> &Alert {
        self.alerts.push(Alert {
            level,
            message: message.into(),
            raised_at: Utc::now(),
        });
        &self.alerts[self.alerts.len() - 1]
    }

    /// Remove the alert at `index`, shifting later ones down.
    ///
    /// Returns `None` when `index` is out of range.
    pub fn dismiss(&mut self, index: usize) -> Option<Alert> {
        (index < self.alerts.len()).then(|| self.alerts.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Alert> {
        self.alerts.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
