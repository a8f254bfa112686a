use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(2800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub duration: Duration,
    pub posted_at: Instant,
}

impl Notice {
    pub fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.posted_at) >= self.duration
    }
}

/// Stack of live notices. Each one expires on its own clock.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn push(&mut self, kind: NoticeKind, message: impl Into<String>, duration: Duration, now: Instant) {
        let message = message.into();
        tracing::debug!(%kind, %message, "notice");
        self.notices.push(Notice {
            kind,
            message,
            duration,
            posted_at: now,
        });
    }

    pub fn prune(&mut self, now: Instant) {
        self.notices.retain(|n| !n.expired(now));
    }

    pub fn live(&self) -> &[Notice] {
        &self.notices
    }
}
