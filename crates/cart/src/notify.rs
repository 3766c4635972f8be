//! User-facing notices.
//!
//! Aborted cart operations surface through a [`Notifier`] rather than as
//! errors to the caller. There are exactly four messages.

use std::fmt;
use std::sync::Mutex;

/// The fixed set of messages shown to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// Adding a product failed (stock or product lookup, or persistence).
    AddFailed,
    /// The requested quantity is above the available stock.
    OutOfStock,
    /// Removing a product failed (not in the cart, or persistence).
    RemoveFailed,
    /// Changing a quantity failed (stock lookup, not in the cart, or persistence).
    UpdateFailed,
}

impl Notice {
    /// The message text.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AddFailed => "error adding product",
            Self::OutOfStock => "requested quantity out of stock",
            Self::RemoveFailed => "error removing product",
            Self::UpdateFailed => "error changing product quantity",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Sink for user-facing notices. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes each notice to the log as a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(notice = ?notice, "{notice}");
    }
}

/// Keeps every notice in arrival order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    /// Messages received so far, as shown to the shopper.
    #[must_use]
    pub fn messages(&self) -> Vec<&'static str> {
        self.notices().into_iter().map(Notice::message).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
