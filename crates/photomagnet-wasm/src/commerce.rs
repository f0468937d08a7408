//! Catalog, cart and checkout bindings.
//!
//! Money crosses the boundary as a JS number of minor units. Plain data
//! such as products, cart lines and payment bodies travel as JS objects with
//! camelCase keys.

use photomagnet_core::cart::{Cart, CartItem};
use photomagnet_core::catalog::{self, Product};
use photomagnet_core::checkout::{self, Checkout, DeliveryDetails, PaymentResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::types::js_error;

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(js_error)
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

/// The built-in products, stamped with an ISO timestamp.
#[wasm_bindgen]
pub fn default_catalog(timestamp: &str) -> Result<JsValue, JsValue> {
    to_js(&catalog::default_catalog(timestamp))
}

/// Images needed before `product_id` can go in the cart.
#[wasm_bindgen]
pub fn required_images(product_id: &str) -> usize {
    catalog::required_images(product_id)
}

/// Discount in minor units for a promo code, or an "Invalid promo code" error.
#[wasm_bindgen]
pub fn apply_promo_code(code: &str, subtotal_cents: f64) -> Result<f64, JsValue> {
    checkout::apply_promo_code(code, cents_from_js(subtotal_cents))
        .map(|discount| discount as f64)
        .map_err(js_error)
}

fn cents_from_js(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct JsCart {
    inner: Cart,
}

#[wasm_bindgen]
impl JsCart {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a cart from an array of `{productId, quantity, images, price}`.
    pub fn from_json(items: JsValue) -> Result<JsCart, JsValue> {
        let items: Vec<CartItem> = from_js(items)?;
        Ok(Self {
            inner: Cart::from_items(items),
        })
    }

    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.items())
    }

    /// Add a configured product. Fails with "Please upload N images..." when
    /// the image count does not match the product.
    pub fn add_item(&mut self, product: JsValue, images: Vec<String>) -> Result<(), JsValue> {
        let product: Product = from_js(product)?;
        self.inner.add_item(&product, images).map_err(js_error)
    }

    pub fn update_images(&mut self, product: JsValue, images: Vec<String>) -> Result<(), JsValue> {
        let product: Product = from_js(product)?;
        self.inner.update_images(&product, images).map_err(js_error)
    }

    pub fn remove_item(&mut self, product_id: &str) -> bool {
        self.inner.remove_item(product_id).is_some()
    }

    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<u32, JsValue> {
        self.inner
            .update_quantity(product_id, quantity)
            .map_err(js_error)
    }

    /// Images of one line, empty when the product is not in the cart.
    pub fn images(&self, product_id: &str) -> Vec<String> {
        self.inner
            .get(product_id)
            .map(|item| item.images.clone())
            .unwrap_or_default()
    }

    #[wasm_bindgen(getter)]
    pub fn item_count(&self) -> u32 {
        self.inner.item_count()
    }

    #[wasm_bindgen(getter)]
    pub fn subtotal_cents(&self) -> f64 {
        self.inner.subtotal_cents() as f64
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

/// Checkout form state for one order.
#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct JsCheckout {
    inner: Checkout,
}

#[wasm_bindgen]
impl JsCheckout {
    /// `details` is a `DeliveryDetails` object; `undefined` starts blank.
    #[wasm_bindgen(constructor)]
    pub fn new(details: JsValue) -> Result<JsCheckout, JsValue> {
        let details = if details.is_undefined() || details.is_null() {
            DeliveryDetails::default()
        } else {
            from_js(details)?
        };
        Ok(Self {
            inner: Checkout::new(details),
        })
    }

    pub fn set_details(&mut self, details: JsValue) -> Result<(), JsValue> {
        self.inner.details = from_js(details)?;
        Ok(())
    }

    /// Try a promo code against the cart. Returns the discount in minor units.
    pub fn apply_promo(&mut self, code: &str, cart: &JsCart) -> Result<f64, JsValue> {
        self.inner
            .apply_promo(code, &cart.inner)
            .map(|discount| discount as f64)
            .map_err(js_error)
    }

    /// `{subtotalCents, discountCents, totalCents}`
    pub fn summary(&self, cart: &JsCart) -> Result<JsValue, JsValue> {
        to_js(&self.inner.summary(&cart.inner))
    }

    /// Body for the payment endpoint, built around a card token.
    pub fn payment_request(&self, cart: &JsCart, token: String) -> Result<JsValue, JsValue> {
        let request = self
            .inner
            .payment_request(&cart.inner, token)
            .map_err(js_error)?;
        to_js(&request)
    }

    /// Settle the cart from the backend's `{success, message?}` reply.
    /// The cart is cleared only when `success` is true.
    pub fn finish(&self, cart: &mut JsCart, response: JsValue) -> Result<(), JsValue> {
        let response: PaymentResponse = from_js(response)?;
        self.inner
            .finish(&mut cart.inner, &response)
            .map_err(js_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_from_js() {
        assert_eq!(cents_from_js(1499.0), 1499);
        assert_eq!(cents_from_js(10.4), 10);
        assert_eq!(cents_from_js(-3.0), 0);
        assert_eq!(cents_from_js(f64::NAN), 0);
    }

    #[test]
    fn test_required_images() {
        assert_eq!(required_images("set-of-9"), 9);
        assert_eq!(required_images("puzzle"), 1);
    }

    #[test]
    fn test_empty_cart_getters() {
        let cart = JsCart::new();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal_cents(), 0.0);
        assert!(cart.images("set-of-3").is_empty());
    }
}
