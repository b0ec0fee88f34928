//! Cart commands.
//!
//! Wires the REST client, the storage file (or in-memory storage), and a
//! notifier into a [`CartStore`], and renders the result for the terminal.

use std::fmt::Write as _;
use std::sync::Arc;

use rocketshoes_cart::{
    ApiClient, ApiError, CartConfig, CartPorts, CartStorage, CartStore, JsonFileStorage,
    MemoryStorage, Notification, NotificationLevel, Notifier, ToastQueue, TracingNotifier,
};
use rocketshoes_core::Cart;

/// A store plus the toast queue it reports into.
pub struct Session {
    pub store: CartStore,
    toasts: Option<Arc<ToastQueue>>,
}

impl Session {
    /// Build a store from configuration.
    ///
    /// `ephemeral` swaps the storage file for in-memory storage; `quiet`
    /// sends notifications to the log instead of the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn open(config: &CartConfig, ephemeral: bool, quiet: bool) -> Result<Self, ApiError> {
        let api = Arc::new(ApiClient::new(&config.api)?);

        let storage: Arc<dyn CartStorage> = if ephemeral {
            Arc::new(MemoryStorage::new())
        } else {
            let storage = JsonFileStorage::new(&config.storage_path);
            tracing::debug!(path = %storage.path().display(), "Using storage file");
            Arc::new(storage)
        };

        let toasts = (!quiet).then(|| Arc::new(ToastQueue::new()));
        let notifier: Arc<dyn Notifier> = match &toasts {
            Some(queue) => queue.clone(),
            None => Arc::new(TracingNotifier),
        };

        let store = CartStore::initialize(CartPorts {
            stock: api.clone(),
            catalog: api,
            storage,
            notifier,
        });

        Ok(Self { store, toasts })
    }

    /// Print and clear pending notifications.
    #[allow(clippy::print_stdout)]
    pub fn print_toasts(&self) {
        if let Some(toasts) = &self.toasts {
            for toast in toasts.drain() {
                println!("{}", render_toast(&toast));
            }
        }
    }

    /// Print the cart.
    #[allow(clippy::print_stdout)]
    pub fn print_cart(&self) {
        print!("{}", render_cart(self.store.cart()));
    }
}

fn render_toast(toast: &Notification) -> String {
    match toast.level {
        NotificationLevel::Success => format!("✔ {}", toast.message),
        NotificationLevel::Error => format!("✖ {}", toast.message),
    }
}

/// Render the cart as a table with line subtotals and the total.
pub fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for product in cart {
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "#{:<5} {:<40} {:>3} x {:>10} = {:>10}",
            product.id,
            product.name,
            product.amount,
            product.price.to_string(),
            product.subtotal().to_string(),
        );
    }
    let _ = writeln!(out, "Total: {}", cart.total());
    out
}
