//! Autoparts CLI - storefront and admin client for the auto parts REST backend.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept in AUTOPARTS_SESSION_FILE)
//! ap-cli auth login -e cliente@example.com -p secreto
//!
//! # Browse the catalog
//! ap-cli products list --category frenos --max-price 50000 --sort price_asc
//!
//! # Fill the cart and pay
//! ap-cli cart add 64b7f0 -q 2
//! ap-cli checkout
//!
//! # Administration
//! ap-cli admin orders status 31 shipped
//! ap-cli admin dashboard
//! ```
//!
//! # Commands
//!
//! - `auth` - Sign in, register, sign out, show the current user
//! - `products` - List, filter and show products
//! - `cart` - Show and change the cart
//! - `favorites` - Show and change saved products
//! - `orders` - Order history
//! - `checkout` - Validate the cart and get the MercadoPago payment URL
//! - `admin` - Orders, users, products and dashboard (admin role required)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autoparts_core::{CartItemId, OrderId, OrderStatus, ProductId, UserId};
use autoparts_storefront::ClientConfig;
use autoparts_storefront::types::{GuestCartItem, ProductSort};

mod commands;

#[derive(Parser)]
#[command(name = "ap-cli")]
#[command(author, version, about = "Autoparts storefront and admin client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, register and sign out
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage saved products
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Validate the cart and print the payment URL
    Checkout,
    /// Store administration
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products matching filters
    List {
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        brand: Option<String>,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
        /// Only products with stock
        #[arg(long)]
        in_stock: bool,
        /// `price_asc`, `price_desc`, `name` or `newest`
        #[arg(long, default_value = "relevance")]
        sort: ProductSort,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one product
    Show { id: ProductId },
    /// List available categories and brands
    Facets,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line (0 removes it)
    Update { item_id: CartItemId, quantity: u32 },
    /// Remove a line
    Remove { item_id: CartItemId },
    /// Remove every line
    Clear,
    /// Merge guest lines given as `PRODUCT_ID:QUANTITY`
    Merge {
        #[arg(required = true, value_parser = commands::cart::parse_guest_item)]
        items: Vec<GuestCartItem>,
    },
    /// Check whether the cart can be paid
    Validate,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Show saved products
    List,
    /// Save a product
    Add { product_id: ProductId },
    /// Remove a saved product
    Remove { product_id: ProductId },
    /// Save or remove depending on the current state
    Toggle { product_id: ProductId },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show { id: OrderId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: AdminOrdersAction,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        action: AdminUsersAction,
    },
    /// Manage the catalog
    Products {
        #[command(subcommand)]
        action: AdminProductsAction,
    },
    /// Show store statistics
    Dashboard,
}

#[derive(Subcommand)]
enum AdminOrdersAction {
    /// List every order
    List,
    /// Show one order
    Show { id: OrderId },
    /// Change the status of an order
    Status { id: OrderId, status: OrderStatus },
}

#[derive(Subcommand)]
enum AdminUsersAction {
    /// List every user
    List,
    /// Show one user
    Show { id: UserId },
    /// Ban or unban a user
    ToggleBan { id: UserId },
}

#[derive(Subcommand)]
enum AdminProductsAction {
    /// Create a product
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        price: Decimal,
        #[arg(short, long, default_value_t = 0)]
        stock: u32,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        brand: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        /// Compatible vehicle, repeatable (e.g. "Ford Fiesta 2012")
        #[arg(long = "vehicle")]
        vehicles: Vec<String>,
    },
    /// Change a product
    Update {
        id: ProductId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        price: Option<Decimal>,
        #[arg(short, long)]
        stock: Option<u32>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        brand: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Delete a product
    Delete { id: ProductId },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "autoparts=info,ap_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = commands::App::new(config)?;

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&app, &email, &password).await?;
            }
            AuthAction::Register {
                name,
                email,
                password,
            } => commands::auth::register(&app, &name, &email, &password).await?,
            AuthAction::Logout => commands::auth::logout(&app)?,
            AuthAction::Whoami => commands::auth::whoami(&app)?,
        },
        Commands::Products { action } => match action {
            ProductsAction::List {
                search,
                category,
                brand,
                min_price,
                max_price,
                in_stock,
                sort,
                page,
                limit,
            } => {
                let filter = autoparts_storefront::types::ProductFilter {
                    search,
                    category,
                    brand,
                    min_price,
                    max_price,
                    in_stock_only: in_stock,
                    sort,
                    page,
                    limit,
                };
                commands::products::list(&app, &filter).await?;
            }
            ProductsAction::Show { id } => commands::products::show(&app, &id).await?,
            ProductsAction::Facets => commands::products::facets(&app).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&app).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&app, &product_id, quantity).await?,
            CartAction::Update { item_id, quantity } => {
                commands::cart::update(&app, &item_id, quantity).await?;
            }
            CartAction::Remove { item_id } => commands::cart::remove(&app, &item_id).await?,
            CartAction::Clear => commands::cart::clear(&app).await?,
            CartAction::Merge { items } => commands::cart::merge(&app, &items).await?,
            CartAction::Validate => commands::cart::validate(&app).await?,
        },
        Commands::Favorites { action } => match action {
            FavoritesAction::List => commands::favorites::list(&app).await?,
            FavoritesAction::Add { product_id } => {
                commands::favorites::add(&app, &product_id).await?;
            }
            FavoritesAction::Remove { product_id } => {
                commands::favorites::remove(&app, &product_id).await?;
            }
            FavoritesAction::Toggle { product_id } => {
                commands::favorites::toggle(&app, &product_id).await?;
            }
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&app).await?,
            OrdersAction::Show { id } => commands::orders::show(&app, &id).await?,
        },
        Commands::Checkout => commands::cart::checkout(&app).await?,
        Commands::Admin { action } => run_admin(&app, action).await?,
    }
    Ok(())
}

async fn run_admin(app: &commands::App, action: AdminAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AdminAction::Orders { action } => match action {
            AdminOrdersAction::List => commands::admin::list_orders(app).await?,
            AdminOrdersAction::Show { id } => commands::admin::show_order(app, &id).await?,
            AdminOrdersAction::Status { id, status } => {
                commands::admin::set_order_status(app, &id, status).await?;
            }
        },
        AdminAction::Users { action } => match action {
            AdminUsersAction::List => commands::admin::list_users(app).await?,
            AdminUsersAction::Show { id } => commands::admin::show_user(app, &id).await?,
            AdminUsersAction::ToggleBan { id } => commands::admin::toggle_ban(app, &id).await?,
        },
        AdminAction::Products { action } => match action {
            AdminProductsAction::Create {
                name,
                price,
                stock,
                description,
                category,
                brand,
                image_url,
                vehicles,
            } => {
                let input = autoparts_admin::ProductInput {
                    name,
                    description,
                    price,
                    stock,
                    category,
                    brand,
                    image_url,
                    compatible_vehicles: vehicles,
                };
                commands::admin::create_product(app, &input).await?;
            }
            AdminProductsAction::Update {
                id,
                name,
                price,
                stock,
                description,
                category,
                brand,
                image_url,
            } => {
                let patch = autoparts_admin::ProductPatch {
                    name,
                    description,
                    price,
                    stock,
                    category,
                    brand,
                    image_url,
                };
                commands::admin::update_product(app, &id, &patch).await?;
            }
            AdminProductsAction::Delete { id } => commands::admin::delete_product(app, &id).await?,
        },
        AdminAction::Dashboard => commands::admin::dashboard(app).await?,
    }
    Ok(())
}
