//! Billing address validation.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static PINCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("pincode pattern compiles"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// The billing address collected at checkout. Shipping mirrors billing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShippingAddress {
    #[serde(rename = "billing_customer_name")]
    pub name: String,

    #[serde(rename = "billing_address")]
    pub address: String,

    #[serde(rename = "billing_city")]
    pub city: String,

    #[serde(rename = "billing_pincode")]
    pub pincode: String,

    #[serde(rename = "billing_state")]
    pub state: String,

    #[serde(rename = "billing_email")]
    pub email: String,

    #[serde(rename = "billing_phone")]
    pub phone: String,
}

/// An address field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressField {
    Name,
    Address,
    City,
    Pincode,
    State,
    Email,
    Phone,
}

impl AddressField {
    /// Message shown to the shopper when this field is invalid.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Name => "Name is required",
            Self::Address => "Address is required",
            Self::City => "City is required",
            Self::Pincode => "Enter valid 6-digit pincode",
            Self::State => "State is required",
            Self::Email => "Enter valid email address",
            Self::Phone => "Enter valid 10-digit phone number",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::City => "city",
            Self::Pincode => "pincode",
            Self::State => "state",
            Self::Email => "email",
            Self::Phone => "phone",
        };

        f.write_str(name)
    }
}

/// Every invalid field of an address, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.messages().join("; "))]
pub struct AddressErrors {
    fields: Vec<AddressField>,
}

impl AddressErrors {
    #[must_use]
    pub fn fields(&self) -> &[AddressField] {
        &self.fields
    }

    #[must_use]
    pub fn contains(&self, field: AddressField) -> bool {
        self.fields.contains(&field)
    }

    #[must_use]
    pub fn messages(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.message()).collect()
    }
}

impl ShippingAddress {
    /// Check every field, reporting all violations together.
    ///
    /// # Errors
    ///
    /// Returns [`AddressErrors`] listing each invalid field.
    pub fn validate(&self) -> Result<(), AddressErrors> {
        let checks = [
            (AddressField::Name, !is_blank(&self.name)),
            (AddressField::Address, !is_blank(&self.address)),
            (AddressField::City, !is_blank(&self.city)),
            (AddressField::Pincode, PINCODE.is_match(&self.pincode)),
            (AddressField::State, !is_blank(&self.state)),
            (AddressField::Email, EMAIL.is_match(&self.email)),
            (AddressField::Phone, PHONE.is_match(&self.phone)),
        ];

        let fields: Vec<AddressField> = checks
            .into_iter()
            .filter(|(_, valid)| !valid)
            .map(|(field, _)| field)
            .collect();

        if fields.is_empty() {
            Ok(())
        } else {
            Err(AddressErrors { fields })
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
