use clap::{Args, Subcommand};
use storefront_app::{
    context::AppContext,
    orders::{Order, OrdersError},
};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List your orders
    List,

    /// Cancel an order
    Cancel(CancelArgs),
}

#[derive(Debug, Args)]
struct CancelArgs {
    /// Order id, as shown by `orders list`
    order_id: String,
}

pub(crate) async fn run(command: OrdersCommand, context: &AppContext) -> Result<(), String> {
    let orders = context
        .orders
        .list_orders()
        .await
        .map_err(|error| format!("failed to fetch orders: {error}"))?;

    match command.command {
        OrdersSubcommand::List => {
            if orders.is_empty() {
                println!("No orders yet");
            }

            for order in &orders {
                print_order(order);
            }

            Ok(())
        }
        OrdersSubcommand::Cancel(args) => {
            let order = orders
                .iter()
                .find(|order| order.order_id == args.order_id)
                .ok_or_else(|| format!("order {} not found", args.order_id))?;

            let cancelled = context
                .orders
                .cancel_order(order)
                .await
                .map_err(|error| match error {
                    OrdersError::NotCancellable { .. } | OrdersError::Rejected(_) => {
                        error.to_string()
                    }
                    OrdersError::Api(_) => format!("failed to cancel order: {error}"),
                })?;

            print_order(&cancelled);

            Ok(())
        }
    }
}

fn print_order(order: &Order) {
    let placed = order
        .placed_at()
        .map_or_else(|| order.order_date.clone(), |at| at.strftime("%Y-%m-%d").to_string());

    println!(
        "{}  {}  {}  {}",
        order.order_id, order.status, placed, order.sub_total
    );

    for item in &order.order_items {
        println!("    {} x {}  {}", item.units, item.selling_price, item.name);
    }
}
