// Single-flight alerting for auth failures.
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

/// The auth alerts the client can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    SessionExpired,
    InsufficientPrivileges,
    LoginRequired,
}

impl AlertKind {
    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::SessionExpired | AlertKind::LoginRequired => "Unauthorized",
            AlertKind::InsufficientPrivileges => "Access denied",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AlertKind::SessionExpired => "Your session has expired. Please log in again.",
            AlertKind::InsufficientPrivileges => {
                "You do not have sufficient privileges for this operation."
            }
            AlertKind::LoginRequired => "Please log in to continue.",
        }
    }
}

/// Presents a blocking alert to the user. `show` resolves when the user has
/// dismissed it.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn show(&self, kind: AlertKind);
}

#[async_trait]
impl<S: AlertSink + ?Sized> AlertSink for std::sync::Arc<S> {
    async fn show(&self, kind: AlertKind) {
        (**self).show(kind).await;
    }
}

/// Guarantees at most one auth alert is visible at a time.
///
/// Many requests can fail in the same episode; whichever reaches the gate
/// first shows the alert, the rest return immediately and continue their own
/// recovery. The flag is set before the alert is shown and cleared after the
/// user dismisses it.
pub struct AlertGate {
    open: AtomicBool,
    sink: Box<dyn AlertSink>,
}

impl AlertGate {
    pub fn new(sink: Box<dyn AlertSink>) -> Self {
        Self {
            open: AtomicBool::new(false),
            sink,
        }
    }

    /// Show the alert unless one is already open.
    pub async fn show_once(&self, kind: AlertKind) {
        if self
            .open
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(?kind, "auth alert already open, coalescing");
            return;
        }
        self.sink.show(kind).await;
        self.open.store(false, Ordering::SeqCst);
    }

    /// Whether an alert is currently open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// CLI sink: prints the alert and dismisses it immediately.
pub struct ConsoleAlert;

#[async_trait]
impl AlertSink for ConsoleAlert {
    async fn show(&self, kind: AlertKind) {
        eprintln!("{}: {}", kind.title(), kind.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Counts alerts and blocks each one until released by the test.
    struct HeldSink {
        shown: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl AlertSink for HeldSink {
        async fn show(&self, _kind: AlertKind) {
            self.shown.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
        }
    }

    #[tokio::test]
    async fn concurrent_failures_show_one_alert() {
        let sink = Arc::new(HeldSink {
            shown: AtomicUsize::new(0),
            release: Notify::new(),
        });

        let gate = Arc::new(AlertGate::new(Box::new(sink.clone())));

        let first = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.show_once(AlertKind::SessionExpired).await })
        };

        // Wait until the first alert is actually open.
        while !gate.is_open() {
            tokio::task::yield_now().await;
        }

        // Everything arriving during the episode coalesces into the open alert.
        gate.show_once(AlertKind::SessionExpired).await;
        gate.show_once(AlertKind::InsufficientPrivileges).await;
        assert_eq!(sink.shown.load(Ordering::SeqCst), 1);

        sink.release.notify_one();
        first.await.unwrap();
        assert!(!gate.is_open());
    }

    #[tokio::test]
    async fn gate_reopens_after_dismissal() {
        struct Immediate(AtomicUsize);
        #[async_trait]
        impl AlertSink for Immediate {
            async fn show(&self, _kind: AlertKind) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let gate = AlertGate::new(Box::new(Immediate(AtomicUsize::new(0))));
        gate.show_once(AlertKind::SessionExpired).await;
        gate.show_once(AlertKind::SessionExpired).await;
        // Sequential episodes each get their own alert.
        assert!(!gate.is_open());
    }
}
