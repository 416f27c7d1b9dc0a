//! REST resource services.
//!
//! Each module adds the calls for one backend resource to [`ApiClient`]:
//!
//! - `products` - catalog listing and lookup (cached)
//! - `cart` - the signed-in customer's cart
//! - `favorites` - saved products
//! - `orders` - order history
//! - `payments` - MercadoPago checkout preferences
//!
//! [`ApiClient`]: crate::api::ApiClient

mod cart;
mod favorites;
mod orders;
mod payments;
mod products;
