//! Session-scoped state: the cart and favorites contexts.
//!
//! Contexts never patch their state locally; they re-fetch from the server
//! after every successful mutation and surface failures through a
//! [`Notifier`].

mod cart;
mod favorites;
mod notify;

pub use cart::{
    CartContext, CartState, MSG_ADDED, MSG_CLEARED, MSG_EMPTY_CART, MSG_INSUFFICIENT_STOCK,
    MSG_INVALID_QUANTITY, MSG_MERGED, MSG_REMOVED, MSG_UPDATED,
};
pub use favorites::{FavoritesContext, FavoritesState, MSG_FAVORITE_ADDED, MSG_FAVORITE_REMOVED};
pub use notify::{Notifier, RecordingNotifier, Toast, ToastKind, TracingNotifier};
