//! User-visible failure notifications.
//!
//! # Responsibility
//! - Carry handled failures from services to the presentation layer as
//!   discrete events.
//!
//! # Invariants
//! - Publishing never blocks and never fails; a dropped receiver turns
//!   publishing into a no-op.

use crate::error::CoreError;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Failure category, used by the UI to pick wording or styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Network,
    Lookup,
    Toggle,
    AuthRequired,
    Auth,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Lookup => "lookup",
            Self::Toggle => "toggle",
            Self::AuthRequired => "auth_required",
            Self::Auth => "auth",
        }
    }
}

/// One failure notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Builds a notice from a core error; cancellation yields `None`.
    pub fn from_error(err: &CoreError) -> Option<Self> {
        err.notice_kind().map(|kind| Self::new(kind, err.to_string()))
    }
}

/// Sending half of the notice stream.
#[derive(Debug, Clone)]
pub struct NoticeSink {
    tx: Option<UnboundedSender<Notice>>,
}

impl NoticeSink {
    /// Sink that drops every notice.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn publish(&self, notice: Notice) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(notice).is_err() {
            debug!("event=notice_publish module=notice status=dropped reason=receiver_closed");
        }
    }

    /// Publishes the notice derived from `err`, if any.
    pub fn publish_error(&self, err: &CoreError) {
        if let Some(notice) = Notice::from_error(err) {
            self.publish(notice);
        }
    }
}

/// Creates a connected sink/receiver pair.
pub fn notice_channel() -> (NoticeSink, UnboundedReceiver<Notice>) {
    let (tx, rx) = unbounded_channel();
    (NoticeSink { tx: Some(tx) }, rx)
}

#[cfg(test)]
mod tests {
    use super::{notice_channel, Notice, NoticeKind, NoticeSink};
    use crate::error::CoreError;

    #[test]
    fn publish_delivers_in_order() {
        let (sink, mut rx) = notice_channel();
        sink.publish(Notice::new(NoticeKind::Network, "first"));
        sink.publish_error(&CoreError::AuthRequired);

        assert_eq!(rx.try_recv().unwrap().message, "first");
        assert_eq!(rx.try_recv().unwrap().kind, NoticeKind::AuthRequired);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publish_after_receiver_drop_is_noop() {
        let (sink, rx) = notice_channel();
        drop(rx);
        sink.publish(Notice::new(NoticeKind::Toggle, "ignored"));
        NoticeSink::disabled().publish(Notice::new(NoticeKind::Toggle, "ignored"));
    }

    #[test]
    fn cancellation_produces_no_notice() {
        let (sink, mut rx) = notice_channel();
        sink.publish_error(&CoreError::Cancelled);
        assert!(rx.try_recv().is_err());
    }
}
