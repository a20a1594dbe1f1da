use async_trait::async_trait;
use clap::Args;
use storefront_app::{
    checkout::{
        GatewayError, PaymentCallback, PaymentGateway, PaymentIntent, PaymentOutcome, Prefill,
        ShippingAddress,
    },
    context::AppContext,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin, stdin},
    sync::Mutex,
};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Full name
    #[arg(long)]
    name: String,

    /// Street address
    #[arg(long)]
    address: String,

    #[arg(long)]
    city: String,

    /// 6-digit pincode
    #[arg(long)]
    pincode: String,

    #[arg(long)]
    state: String,

    #[arg(long)]
    email: String,

    /// 10-digit phone number
    #[arg(long)]
    phone: String,
}

impl From<CheckoutArgs> for ShippingAddress {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            name: args.name,
            address: args.address,
            city: args.city,
            pincode: args.pincode,
            state: args.state,
            email: args.email,
            phone: args.phone,
        }
    }
}

/// Payment step driven from the terminal: the shopper pays out of band and
/// pastes the provider's payment id and signature.
struct ConsoleGateway {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleGateway {
    fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(stdin()).lines()),
        }
    }

    async fn prompt(&self, label: &str) -> Result<String, GatewayError> {
        eprint!("{label}: ");

        let line = self.lines.lock().await.next_line().await?;

        Ok(line.unwrap_or_default().trim().to_string())
    }
}

#[async_trait]
impl PaymentGateway for ConsoleGateway {
    async fn collect(
        &self,
        intent: &PaymentIntent,
        prefill: &Prefill,
    ) -> Result<PaymentOutcome, GatewayError> {
        eprintln!("payment order: {}", intent.order_id);
        if let (Some(amount), Some(currency)) = (intent.amount, intent.currency.as_deref()) {
            eprintln!("amount: {amount} {currency}");
        }
        eprintln!("payer: {} <{}> {}", prefill.name, prefill.email, prefill.contact);
        eprintln!("leave the payment id empty to cancel");

        let payment_id = self.prompt("payment id").await?;

        if payment_id.is_empty() {
            return Ok(PaymentOutcome::Dismissed);
        }

        let signature = self.prompt("signature").await?;

        Ok(PaymentOutcome::Completed(PaymentCallback {
            razorpay_order_id: intent.order_id.clone(),
            razorpay_payment_id: payment_id,
            razorpay_signature: signature,
        }))
    }
}

pub(crate) async fn run(args: CheckoutArgs, context: &mut AppContext) -> Result<(), String> {
    let address = ShippingAddress::from(args);
    let user = context
        .session
        .as_ref()
        .and_then(|session| session.user.as_ref());

    let receipt = context
        .checkout
        .checkout(&mut context.cart, &address, user, &ConsoleGateway::new())
        .await
        .map_err(|error| error.to_string())?;

    println!("order placed");
    println!("order_id: {}", receipt.order_id);
    println!("payment_id: {}", receipt.payment_id);
    println!("total: {}", receipt.total);

    Ok(())
}
