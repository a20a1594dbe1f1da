use clap::{Args, Subcommand};
use storefront::{cart::CartStore, items::ProductId, pricing::to_money, storage::KeyValueStore};
use storefront_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show items and totals
    Show,

    /// Add a catalog product
    Add(AddArgs),

    /// Remove a product entirely
    Remove(ProductArgs),

    /// Set a product's quantity; zero removes it
    Set(SetArgs),

    /// Empty the cart and drop the coupon
    Clear,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id
    product_id: String,

    /// Units to add
    #[arg(long, short, default_value_t = 1)]
    quantity: u32,
}

#[derive(Debug, Args)]
struct ProductArgs {
    /// Product id
    product_id: String,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Product id
    product_id: String,

    /// New quantity
    quantity: u32,
}

pub(crate) async fn run(command: CartCommand, context: &mut AppContext) -> Result<(), String> {
    match command.command {
        CartSubcommand::Show => {}
        CartSubcommand::Add(args) => {
            let product = context
                .products
                .get(&args.product_id)
                .await
                .map_err(|error| format!("failed to fetch product: {error}"))?;

            let item = product
                .to_line_item(args.quantity, context.cart.currency())
                .map_err(|error| format!("failed to price product: {error}"))?;

            context
                .cart
                .add_item(item)
                .map_err(|error| format!("failed to add item: {error}"))?;
        }
        CartSubcommand::Remove(args) => context
            .cart
            .remove_item(&ProductId::new(args.product_id))
            .map_err(|error| format!("failed to remove item: {error}"))?,
        CartSubcommand::Set(args) => context
            .cart
            .set_quantity(&ProductId::new(args.product_id), args.quantity)
            .map_err(|error| format!("failed to update quantity: {error}"))?,
        CartSubcommand::Clear => context
            .cart
            .clear()
            .map_err(|error| format!("failed to clear cart: {error}"))?,
    }

    print_cart(&context.cart)
}

pub(crate) fn print_cart<S: KeyValueStore>(cart: &CartStore<S>) -> Result<(), String> {
    if cart.is_empty() {
        println!("Your cart is empty");

        return Ok(());
    }

    for item in cart.items() {
        let unit_price = to_money(item.unit_price(), cart.currency())
            .map_err(|error| format!("failed to price item: {error}"))?;

        println!(
            "{}  {} x {}  {}",
            item.id(),
            item.quantity(),
            unit_price,
            item.name()
        );
    }

    let totals = cart
        .totals()
        .map_err(|error| format!("failed to price cart: {error}"))?;

    println!();
    println!("subtotal: {}", totals.subtotal());

    if let Some(coupon) = cart.applied_coupon() {
        println!(
            "discount: -{} ({} {}%)",
            totals.discount(),
            coupon.code(),
            coupon.discount_percentage()
        );
    }

    println!("total: {}", totals.total());

    Ok(())
}
