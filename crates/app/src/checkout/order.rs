//! Order payload sent with a payment intent.

use jiff::Timestamp;
use rand::Rng;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Serialize;
use storefront::{
    items::LineItem,
    pricing::{PricingError, major_from_minor, to_minor},
};

use crate::{auth::User, checkout::address::ShippingAddress};

const ORDER_ID_PREFIX: &str = "ORDER";
const ORDER_ID_SUFFIX_LEN: usize = 13;

const ISD_CODE: &str = "+91";
const COUNTRY: &str = "India";
const PAYMENT_METHOD: &str = "Prepaid";

const PARCEL_SIDE: u32 = 10;
const PARCEL_WEIGHT: u32 = 1;
const ITEM_WEIGHT: f64 = 0.5;

/// Correlation id for a checkout attempt: `ORDER_<unix millis>_<13 base36 chars>`.
#[must_use]
pub fn generate_order_id() -> String {
    order_id_at(Timestamp::now(), &mut rand::thread_rng())
}

fn order_id_at<R: Rng + ?Sized>(now: Timestamp, rng: &mut R) -> String {
    let suffix: String = (0..ORDER_ID_SUFFIX_LEN)
        .map(|_| char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect();

    format!("{ORDER_ID_PREFIX}_{}_{suffix}", now.as_millisecond())
}

/// One line of the order payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub name: String,
    pub sku: String,
    pub units: u32,
    pub product: String,
    pub selling_price: String,
    pub discount: String,
    pub tax: String,
    pub hsn: String,
    pub brand: String,
    pub weight: f64,
}

/// Order details forwarded to the backend, which relays them to fulfilment.
///
/// Shipping always mirrors billing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    pub order_id: String,

    #[serde(flatten)]
    pub billing: ShippingAddress,

    pub billing_country: String,
    pub billing_address_2: String,
    pub billing_alternate_phone: String,
    pub billing_isd_code: String,

    pub shipping_is_billing: bool,
    pub shipping_customer_name: String,
    pub shipping_last_name: String,
    pub shipping_address: String,
    pub shipping_address_2: String,
    pub shipping_city: String,
    pub shipping_pincode: String,
    pub shipping_state: String,
    pub shipping_country: String,
    pub shipping_email: String,
    pub shipping_phone: String,

    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub sub_total: Decimal,

    pub user: Option<String>,
    pub order_items: Vec<OrderItem>,
    pub payment_method: String,

    pub length: u32,
    pub breadth: u32,
    pub height: u32,
    pub weight: u32,

    pub shipping_charges: u32,
    pub giftwrap_charges: u32,
    pub transaction_charges: u32,
    pub total_discount: u32,
}

impl OrderDetails {
    /// Build the payload for a cart. `total` is the amount payable and becomes
    /// the order subtotal.
    ///
    /// # Errors
    ///
    /// Returns an error if `total` is negative.
    pub fn from_cart(
        order_id: String,
        address: &ShippingAddress,
        items: &[LineItem],
        total: &Money<'static, Currency>,
        user: Option<&User>,
    ) -> Result<Self, PricingError> {
        let currency = total.currency();
        let sub_total = major_from_minor(to_minor(total)?, currency);

        let order_items = items
            .iter()
            .map(|item| OrderItem {
                name: item.name().to_string(),
                sku: item.name().to_string(),
                units: item.quantity(),
                product: item.id().to_string(),
                selling_price: major_from_minor(item.unit_price(), currency)
                    .normalize()
                    .to_string(),
                discount: "0".to_string(),
                tax: "0".to_string(),
                hsn: String::new(),
                brand: String::new(),
                weight: ITEM_WEIGHT,
            })
            .collect();

        Ok(Self {
            order_id,
            billing: address.clone(),
            billing_country: COUNTRY.to_string(),
            billing_address_2: String::new(),
            billing_alternate_phone: String::new(),
            billing_isd_code: ISD_CODE.to_string(),
            shipping_is_billing: true,
            shipping_customer_name: address.name.clone(),
            shipping_last_name: String::new(),
            shipping_address: address.address.clone(),
            shipping_address_2: String::new(),
            shipping_city: address.city.clone(),
            shipping_pincode: address.pincode.clone(),
            shipping_state: address.state.clone(),
            shipping_country: COUNTRY.to_string(),
            shipping_email: address.email.clone(),
            shipping_phone: address.phone.clone(),
            sub_total,
            user: user.map(|user| user.id.clone()),
            order_items,
            payment_method: PAYMENT_METHOD.to_string(),
            length: PARCEL_SIDE,
            breadth: PARCEL_SIDE,
            height: PARCEL_SIDE,
            weight: PARCEL_WEIGHT,
            shipping_charges: 0,
            giftwrap_charges: 0,
            transaction_charges: 0,
            total_discount: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use rusty_money::iso::INR;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Asha Rao".to_string(),
            address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            pincode: "560001".to_string(),
            state: "Karnataka".to_string(),
            email: "asha@example.in".to_string(),
            phone: "9876543210".to_string(),
        }
    }

    #[test]
    fn order_id_has_prefix_millis_and_base36_suffix() -> TestResult {
        let now = Timestamp::from_millisecond(1_700_000_000_123)?;
        let mut rng = StdRng::seed_from_u64(7);

        let id = order_id_at(now, &mut rng);
        let parts: Vec<&str> = id.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts.first().copied(), Some("ORDER"));
        assert_eq!(parts.get(1).copied(), Some("1700000000123"));

        let suffix = parts.get(2).copied().unwrap_or_default();
        assert_eq!(suffix.len(), 13);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );

        Ok(())
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(generate_order_id(), generate_order_id());
    }

    #[test]
    fn payload_mirrors_billing_to_shipping() -> TestResult {
        let items = [
            LineItem::new("p1", "Cotton Kurta", 25_00, 2),
            LineItem::new("p2", "Silk Scarf", 10_50, 1),
        ];
        let user = User {
            id: "u1".to_string(),
            name: None,
            phone: None,
        };

        let details = OrderDetails::from_cart(
            "ORDER_1_abc".to_string(),
            &address(),
            &items,
            &Money::from_minor(54_50, INR),
            Some(&user),
        )?;

        let value = serde_json::to_value(&details)?;

        assert_eq!(value["billing_customer_name"], json!("Asha Rao"));
        assert_eq!(value["shipping_customer_name"], json!("Asha Rao"));
        assert_eq!(value["shipping_pincode"], json!("560001"));
        assert_eq!(value["shipping_country"], json!("India"));
        assert_eq!(value["billing_isd_code"], json!("+91"));
        assert_eq!(value["shipping_is_billing"], json!(true));
        assert_eq!(value["payment_method"], json!("Prepaid"));
        assert_eq!(value["sub_total"], json!(54.5));
        assert_eq!(value["user"], json!("u1"));
        assert_eq!(value["length"], json!(10));
        assert_eq!(value["weight"], json!(1));
        assert_eq!(
            value["order_items"][0],
            json!({
                "name": "Cotton Kurta",
                "sku": "Cotton Kurta",
                "units": 2,
                "product": "p1",
                "selling_price": "25",
                "discount": "0",
                "tax": "0",
                "hsn": "",
                "brand": "",
                "weight": 0.5
            })
        );
        assert_eq!(value["order_items"][1]["selling_price"], json!("10.5"));

        Ok(())
    }
}
