//! User-facing notifications ("toasts").

use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

/// Kind of notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// A notification for the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Sink for notifications raised by the state contexts.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);

    fn success(&self, message: &str) {
        self.notify(Toast {
            kind: ToastKind::Success,
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.notify(Toast {
            kind: ToastKind::Error,
            message: message.to_string(),
        });
    }

    fn info(&self, message: &str) {
        self.notify(Toast {
            kind: ToastKind::Info,
            message: message.to_string(),
        });
    }
}

/// Emits notifications as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Error => warn!(message = %toast.message, "toast"),
            ToastKind::Success | ToastKind::Info => info!(message = %toast.message, "toast"),
        }
    }
}

/// Keeps every notification in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of the error notifications received so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.of_kind(ToastKind::Error)
    }

    /// Messages of the success notifications received so far.
    #[must_use]
    pub fn successes(&self) -> Vec<String> {
        self.of_kind(ToastKind::Success)
    }

    fn of_kind(&self, kind: ToastKind) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.message)
            .collect()
    }

    pub fn clear(&self) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order_and_kinds() {
        let notifier = RecordingNotifier::new();
        notifier.success("Producto agregado al carrito");
        notifier.error("Stock insuficiente");
        notifier.info("Hola");

        assert_eq!(notifier.toasts().len(), 3);
        assert_eq!(notifier.successes(), vec!["Producto agregado al carrito"]);
        assert_eq!(notifier.errors(), vec!["Stock insuficiente"]);

        notifier.clear();
        assert!(notifier.toasts().is_empty());
    }
}
