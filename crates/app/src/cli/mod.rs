use clap::{Parser, Subcommand};
use storefront_app::{
    config::{LoggingConfig, StorefrontConfig},
    context::AppContext,
    observability,
};

mod auth;
mod cart;
mod checkout;
mod coupon;
mod orders;
mod products;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    storefront: StorefrontConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect and edit the cart
    Cart(cart::CartCommand),

    /// Apply, remove or list coupons
    Coupon(coupon::CouponCommand),

    /// Pay for the cart
    Checkout(checkout::CheckoutArgs),

    /// Order history
    Orders(orders::OrdersCommand),

    /// Sign in with a one-time password
    Login(auth::LoginCommand),

    /// Sign out and empty the cart
    Logout,

    /// Browse the catalog
    Products(products::ProductsCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init(&self.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let mut context = AppContext::from_config(&self.storefront)
            .map_err(|error| format!("failed to start: {error}"))?;

        match self.command {
            Commands::Cart(command) => cart::run(command, &mut context).await,
            Commands::Coupon(command) => {
                coupon::run(command, &mut context, &self.storefront).await
            }
            Commands::Checkout(args) => checkout::run(args, &mut context).await,
            Commands::Orders(command) => orders::run(command, &context).await,
            Commands::Login(command) => auth::login(command, &mut context).await,
            Commands::Logout => auth::logout(&mut context),
            Commands::Products(command) => products::run(command, &context).await,
        }
    }
}
