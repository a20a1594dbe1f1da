use clap::{Args, Subcommand};
use storefront_app::{
    context::AppContext,
    products::{Product, active_products, hot_deals},
};

#[derive(Debug, Args)]
pub(crate) struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductsSubcommand {
    /// List active products
    List(ListArgs),

    /// Show one product
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only discounted products on offer
    #[arg(long)]
    hot_deals: bool,

    /// Only products in this category
    #[arg(long)]
    category: Option<String>,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Product id, or slug with `--slug`
    product: String,

    #[arg(long)]
    slug: bool,
}

pub(crate) async fn run(command: ProductsCommand, context: &AppContext) -> Result<(), String> {
    match command.command {
        ProductsSubcommand::List(args) => {
            let products = match args.category.as_deref() {
                Some(category) => context.products.by_category(category).await,
                None => context.products.list().await,
            }
            .map_err(|error| format!("failed to fetch products: {error}"))?;

            let shown = if args.hot_deals {
                hot_deals(&products)
            } else {
                active_products(&products)
            };

            for product in shown {
                print_summary(product);
            }
        }
        ProductsSubcommand::Show(args) => {
            let product = if args.slug {
                context.products.get_by_slug(&args.product).await
            } else {
                context.products.get(&args.product).await
            }
            .map_err(|error| format!("failed to fetch product: {error}"))?;

            print_summary(&product);

            if !product.description.is_empty() {
                println!();
                println!("{}", product.description);
            }

            if !product.is_available {
                println!("currently unavailable");
            }
        }
    }

    Ok(())
}

fn print_summary(product: &Product) {
    if product.is_discounted() {
        println!(
            "{}  {}  {} (was {}, save {})",
            product.id,
            product.name,
            product.selling_price(),
            product.base_price,
            product.discount_amount()
        );
    } else {
        println!("{}  {}  {}", product.id, product.name, product.selling_price());
    }
}
