//! Shopping cart.
//!
//! A line holds one product configuration: the rendered face images in slot
//! order plus the unit price captured when the line was added. A line can
//! only exist with exactly as many images as the product requires.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Please upload {required} image{} before adding to cart", plural(.required))]
    MissingImages { required: usize, uploaded: usize },
    #[error("{0} is not in the cart")]
    NotInCart(String),
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}

impl CartError {
    /// How many more images the customer has to supply.
    pub fn missing(&self) -> usize {
        match self {
            CartError::MissingImages { required, uploaded } => required.saturating_sub(*uploaded),
            CartError::NotInCart(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
    /// Data URLs of the rendered faces.
    pub images: Vec<String>,
    /// Unit price in minor units.
    #[serde(rename = "price")]
    pub price_cents: u64,
}

impl CartItem {
    pub fn line_total_cents(&self) -> u64 {
        self.price_cents * u64::from(self.quantity)
    }
}

fn check_images(product: &Product, images: &[String]) -> Result<(), CartError> {
    let required = product.required_images();
    if images.len() != required {
        return Err(CartError::MissingImages {
            required,
            uploaded: images.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Add a configured product with quantity 1.
    ///
    /// A product already in the cart has its line replaced, keeping the
    /// quantity the customer chose.
    pub fn add_item(&mut self, product: &Product, images: Vec<String>) -> Result<(), CartError> {
        check_images(product, &images)?;
        match self.items.iter_mut().find(|item| item.product_id == product.id) {
            Some(existing) => {
                existing.images = images;
                existing.price_cents = product.price_cents;
                log::info!("replaced cart line for {}", product.id);
            }
            None => {
                self.items.push(CartItem {
                    product_id: product.id.clone(),
                    quantity: 1,
                    images,
                    price_cents: product.price_cents,
                });
                log::info!("added {} to cart", product.id);
            }
        }
        Ok(())
    }

    /// Swap the images of an existing line after re-editing.
    pub fn update_images(&mut self, product: &Product, images: Vec<String>) -> Result<(), CartError> {
        check_images(product, &images)?;
        let item = self.item_mut(&product.id)?;
        item.images = images;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.product_id == product_id)?;
        Some(self.items.remove(index))
    }

    /// Set a line's quantity. Quantities never drop below 1.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<u32, CartError> {
        let item = self.item_mut(product_id)?;
        item.quantity = quantity.max(1);
        Ok(item.quantity)
    }

    pub fn get(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Units in the cart, counting quantities.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn subtotal_cents(&self) -> u64 {
        self.items.iter().map(CartItem::line_total_cents).sum()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn item_mut(&mut self, product_id: &str) -> Result<&mut CartItem, CartError> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.to_string()))
    }
}
