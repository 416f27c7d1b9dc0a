//! Terminal rendering.

#![allow(clippy::print_stdout)]

use rust_decimal::Decimal;

use autoparts_admin::DashboardStats;
use autoparts_core::{Price, ProductId};
use autoparts_storefront::state::{Notifier, Toast, ToastKind};
use autoparts_storefront::types::{
    Cart, CheckoutValidation, Facets, FavoriteItem, Order, Product, ProductPage, User,
};

/// Prints notifications to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        let marker = match toast.kind {
            ToastKind::Success => "ok",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        };
        println!("[{marker}] {}", toast.message);
    }
}

fn money(amount: Decimal) -> String {
    Price::from_amount(amount).display()
}

pub fn line(text: &str) {
    println!("{text}");
}

pub fn user(user: &User) {
    let banned = if user.is_banned { "  (bloqueado)" } else { "" };
    println!(
        "{}  {} <{}>  [{}]{banned}",
        user.id,
        user.display_name(),
        user.email,
        user.role
    );
}

pub fn users(users: &[User]) {
    if users.is_empty() {
        println!("No hay usuarios");
        return;
    }
    for u in users {
        user(u);
    }
}

fn product_line(product: &Product) -> String {
    let stock = match product.stock {
        Some(0) => "sin stock".to_string(),
        Some(n) => format!("stock {n}"),
        None => String::new(),
    };
    let brand = product.brand.as_deref().unwrap_or("-");
    format!(
        "{:<26} {:<40} {:<14} {:>12}  {stock}",
        product.id,
        product.name,
        brand,
        money(product.price)
    )
}

pub fn product_page(page: &ProductPage) {
    if page.products.is_empty() {
        println!("No se encontraron productos");
        return;
    }
    for product in &page.products {
        println!("{}", product_line(product));
    }
    println!(
        "\nPágina {} de {} ({} productos)",
        page.page.max(1),
        page.total_pages().max(1),
        page.total
    );
}

pub fn product(product: &Product) {
    println!("{}", product.name);
    println!("  id:        {}", product.id);
    println!("  precio:    {}", money(product.price));
    if let Some(stock) = product.stock {
        println!("  stock:     {stock}");
    }
    if let Some(category) = &product.category {
        println!("  categoría: {category}");
    }
    if let Some(brand) = &product.brand {
        println!("  marca:     {brand}");
    }
    if let Some(description) = &product.description {
        println!("\n{description}");
    }
    if !product.compatible_vehicles.is_empty() {
        println!("\nCompatible con:");
        for vehicle in &product.compatible_vehicles {
            println!("  - {vehicle}");
        }
    }
}

pub fn facets(facets: &Facets) {
    println!("Categorías: {}", facets.categories.join(", "));
    println!("Marcas:     {}", facets.brands.join(", "));
}

pub fn cart(cart: Option<&Cart>) {
    let Some(cart) = cart.filter(|c| !c.is_empty()) else {
        println!("Tu carrito está vacío");
        return;
    };
    for item in &cart.items {
        println!(
            "{:<26} {:<40} {:>3} x {:>12} = {:>12}",
            item.id,
            item.name(),
            item.quantity,
            money(item.unit_price),
            money(item.subtotal)
        );
    }
    let summary = &cart.summary;
    println!("\nProductos: {}", cart.item_count());
    println!("Subtotal:  {}", money(summary.subtotal));
    if summary.discount > Decimal::ZERO {
        println!("Descuento: -{}", money(summary.discount));
    }
    if summary.tax > Decimal::ZERO {
        println!("Impuestos: {}", money(summary.tax));
    }
    println!("Total:     {}", money(summary.total));
}

pub fn validation(validation: &CheckoutValidation) {
    if validation.valid {
        println!("El carrito está listo para pagar");
    } else {
        for error in &validation.errors {
            println!("  - {error}");
        }
    }
}

pub fn favorites(items: &[FavoriteItem]) {
    if items.is_empty() {
        println!("No tienes favoritos");
        return;
    }
    for item in items {
        match &item.product {
            Some(product) => println!("{}", product_line(product)),
            None => println!("{}", item.product_id),
        }
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No hay pedidos");
        return;
    }
    for order in orders {
        let date = order
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:<26} {:<10} {:<12} {:>3} productos {:>12}",
            order.id,
            date,
            order.status.label(),
            order.item_count(),
            money(order.total)
        );
    }
}

pub fn order(order: &Order) {
    println!("Pedido {}", order.id);
    println!("  estado: {}", order.status.label());
    if let Some(payment_id) = &order.payment_id {
        println!("  pago:   {payment_id}");
    }
    for item in &order.items {
        let name = item
            .name
            .as_deref()
            .or_else(|| item.product_id.as_ref().map(ProductId::as_str))
            .unwrap_or("-");
        println!(
            "  {:>3} x {:<40} {:>12}",
            item.quantity,
            name,
            money(item.subtotal())
        );
    }
    println!("  total:  {}", money(order.total));
}

pub fn dashboard(stats: &DashboardStats) {
    println!("Pedidos:          {}", stats.order_count);
    for (status, count) in &stats.orders_by_status {
        println!("  {:<16}{count}", status.label());
    }
    println!("Ingresos:         {}", money(stats.revenue));
    println!("Ticket promedio:  {}", money(stats.average_order_value));
    println!(
        "Usuarios:         {} ({} bloqueados)",
        stats.user_count, stats.banned_users
    );
    if !stats.low_stock.is_empty() {
        println!("\nStock bajo:");
        for product in &stats.low_stock {
            println!("{}", product_line(product));
        }
    }
}
