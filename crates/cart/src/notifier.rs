//! User-facing notifications.
//!
//! The store reports the outcome of every operation through a [`Notifier`].
//! A UI shows these as toasts; [`ToastQueue`] collects them so the front end
//! can drain and render them, and [`TracingNotifier`] just logs them.

use std::sync::{Mutex, PoisonError};

/// Message catalog.
pub mod messages {
    pub const OUT_OF_STOCK: &str = "requested quantity exceeds stock";
    pub const NOT_IN_CART: &str = "product not found in cart";
    pub const ADD_FAILED: &str = "error adding product";
    pub const REMOVE_FAILED: &str = "error removing product";
    pub const UPDATE_FAILED: &str = "error updating product quantity";

    pub const ADDED: &str = "product added to cart";
    pub const REMOVED: &str = "product removed from cart";
    pub const UPDATED: &str = "product quantity updated";
}

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A single user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Fire-and-forget message sink.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Logs notifications through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notification = message, "Cart notification");
    }

    // Below warn so rejections stay out of Sentry
    fn error(&self, message: &str) {
        tracing::info!(notification = message, failed = true, "Cart notification");
    }
}

/// Collects notifications for a front end to display.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Mutex<Vec<Notification>>,
}

impl ToastQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    fn push(&self, level: NotificationLevel, message: &str) {
        self.lock().push(Notification {
            level,
            message: message.to_string(),
        });
    }

    // A panic while pushing cannot leave the Vec half-written.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for ToastQueue {
    fn success(&self, message: &str) {
        self.push(NotificationLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(NotificationLevel::Error, message);
    }
}
