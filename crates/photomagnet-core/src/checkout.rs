//! Checkout boundary.
//!
//! Promo codes, delivery details and the payment wire types. Talking to the
//! card processor and the payment backend is left to a [`PaymentGateway`]
//! implementation; the core only builds the request and decides what happens
//! to the cart afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;

/// The one promo code the storefront honours.
pub const PROMO_CODE: &str = "SAVE10";

/// Percentage taken off the subtotal by [`PROMO_CODE`].
pub const PROMO_PERCENT: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Missing delivery detail: {0}")]
    MissingDeliveryField(&'static str),
    #[error("Invalid promo code")]
    InvalidPromoCode,
    #[error("Card tokenization failed: {0}")]
    Tokenization(String),
    #[error("Payment request failed: {0}")]
    Network(String),
    #[error("Payment declined{}", reason(.0))]
    Declined(Option<String>),
}

fn reason(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

/// Discount in minor units for `code` against `subtotal_cents`.
///
/// Codes are matched case-insensitively after trimming. Ten percent is
/// rounded half up to the nearest minor unit.
pub fn apply_promo_code(code: &str, subtotal_cents: u64) -> Result<u64, CheckoutError> {
    if code.trim().eq_ignore_ascii_case(PROMO_CODE) {
        Ok((subtotal_cents * PROMO_PERCENT + 50) / 100)
    } else {
        Err(CheckoutError::InvalidPromoCode)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl DeliveryDetails {
    /// Every field is required; returns the first blank one by its wire name.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let fields = [
            ("fullName", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(CheckoutError::MissingDeliveryField(*name)),
            None => Ok(()),
        }
    }
}

/// Body posted to the payment backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Single-use card token from the processor.
    pub token: String,
    pub delivery_details: DeliveryDetails,
    /// Amount to charge, in minor units.
    pub total_amount: u64,
    /// Discount in major units.
    pub discount: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Amounts shown on the order summary, all in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub subtotal_cents: u64,
    pub discount_cents: u64,
    pub total_cents: u64,
}

/// Card processor plus payment backend.
pub trait PaymentGateway {
    /// Whatever the processor needs to tokenize a card.
    type Card;

    fn create_token(&mut self, card: &Self::Card) -> Result<String, CheckoutError>;

    fn submit_payment(&mut self, request: &PaymentRequest) -> Result<PaymentResponse, CheckoutError>;
}

/// Checkout form state: delivery details and the accepted promo code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub details: DeliveryDetails,
    promo_code: Option<String>,
}

impl Checkout {
    pub fn new(details: DeliveryDetails) -> Self {
        Self {
            details,
            promo_code: None,
        }
    }

    pub fn promo_code(&self) -> Option<&str> {
        self.promo_code.as_deref()
    }

    /// Try a promo code. A rejected code also drops any previously accepted one.
    pub fn apply_promo(&mut self, code: &str, cart: &Cart) -> Result<u64, CheckoutError> {
        match apply_promo_code(code, cart.subtotal_cents()) {
            Ok(discount) => {
                self.promo_code = Some(code.trim().to_string());
                Ok(discount)
            }
            Err(e) => {
                self.promo_code = None;
                Err(e)
            }
        }
    }

    /// Totals for the cart as it is now; the discount follows the subtotal.
    pub fn summary(&self, cart: &Cart) -> OrderSummary {
        let subtotal_cents = cart.subtotal_cents();
        let discount_cents = self
            .promo_code
            .as_deref()
            .and_then(|code| apply_promo_code(code, subtotal_cents).ok())
            .unwrap_or(0);
        OrderSummary {
            subtotal_cents,
            discount_cents,
            total_cents: subtotal_cents - discount_cents,
        }
    }

    /// Check the order can be placed at all.
    pub fn validate(&self, cart: &Cart) -> Result<(), CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.details.validate()
    }

    pub fn payment_request(&self, cart: &Cart, token: String) -> Result<PaymentRequest, CheckoutError> {
        self.validate(cart)?;
        let summary = self.summary(cart);
        Ok(PaymentRequest {
            token,
            delivery_details: self.details.clone(),
            total_amount: summary.total_cents,
            discount: summary.discount_cents as f64 / 100.0,
        })
    }

    /// Apply the backend's answer. The cart is cleared only on success.
    pub fn finish(&self, cart: &mut Cart, response: &PaymentResponse) -> Result<(), CheckoutError> {
        if response.success {
            log::info!("payment accepted, clearing {} cart lines", cart.items().len());
            cart.clear();
            Ok(())
        } else {
            log::warn!("payment declined: {:?}", response.message);
            Err(CheckoutError::Declined(response.message.clone()))
        }
    }

    /// Tokenize, submit and settle the cart in one go.
    pub fn place_order<G: PaymentGateway>(
        &self,
        cart: &mut Cart,
        gateway: &mut G,
        card: &G::Card,
    ) -> Result<PaymentResponse, CheckoutError> {
        self.validate(cart)?;
        let token = gateway.create_token(card)?;
        let request = self.payment_request(cart, token)?;
        log::debug!("submitting payment of {} minor units", request.total_amount);
        let response = gateway.submit_payment(&request)?;
        self.finish(cart, &response)?;
        Ok(response)
    }
}
