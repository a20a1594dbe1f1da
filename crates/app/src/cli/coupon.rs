use clap::{Args, Subcommand};
use storefront::{
    coupons::{CouponPolicy, default_coupons},
    pricing::to_money,
};
use storefront_app::{
    config::{CouponSource, StorefrontConfig},
    context::AppContext,
    coupons::HttpCouponCatalog,
};

use super::cart::print_cart;

#[derive(Debug, Args)]
pub(crate) struct CouponCommand {
    #[command(subcommand)]
    command: CouponSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponSubcommand {
    /// Apply a coupon code to the cart
    Apply(ApplyArgs),

    /// Drop the applied coupon
    Remove,

    /// List available coupons
    List,
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// Coupon code
    code: String,
}

pub(crate) async fn run(
    command: CouponCommand,
    context: &mut AppContext,
    config: &StorefrontConfig,
) -> Result<(), String> {
    match command.command {
        CouponSubcommand::Apply(args) => {
            let coupon = context
                .cart
                .apply_coupon(&args.code, context.coupons.as_ref())
                .await
                .map_err(|error| error.to_string())?;

            println!("applied {}", coupon.code());

            print_cart(&context.cart)
        }
        CouponSubcommand::Remove => {
            context
                .cart
                .remove_coupon()
                .map_err(|error| format!("failed to remove coupon: {error}"))?;

            print_cart(&context.cart)
        }
        CouponSubcommand::List => {
            let coupons: Vec<CouponPolicy> = match config.coupon_source {
                CouponSource::Static => default_coupons(context.cart.currency())
                    .iter()
                    .cloned()
                    .collect(),
                CouponSource::Remote => HttpCouponCatalog::new(context.api.clone())
                    .list()
                    .await
                    .map_err(|error| format!("failed to fetch coupons: {error}"))?
                    .iter()
                    .filter(|coupon| coupon.active)
                    .filter_map(|coupon| coupon.to_policy().ok())
                    .collect(),
            };

            for coupon in &coupons {
                print_coupon(context, coupon)?;
            }

            Ok(())
        }
    }
}

fn print_coupon(context: &AppContext, coupon: &CouponPolicy) -> Result<(), String> {
    let currency = context.cart.currency();
    let money = |minor| {
        to_money(minor, currency).map_err(|error| format!("failed to format amount: {error}"))
    };

    let mut line = format!("{}  {}% off", coupon.code(), coupon.discount_percentage());

    if let Some(minimum) = coupon.minimum_purchase() {
        line.push_str(&format!(", minimum purchase {}", money(minimum)?));
    }

    if let Some(maximum) = coupon.maximum_discount() {
        line.push_str(&format!(", up to {}", money(maximum)?));
    }

    println!("{line}");

    Ok(())
}
