//! Product catalog.
//!
//! Products are magnet sets (one face per image) or a puzzle (one image cut
//! into a 3x3 grid). Physical sizes are in millimetres; prices are in minor
//! currency units.

use serde::{Deserialize, Serialize};

use crate::compose::RenderTarget;
use crate::config::PipelineConfig;
use crate::transform::AspectRatio;

/// Pieces per side of the catalog puzzle.
pub const PUZZLE_GRID: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Set,
    Puzzle,
}

/// Physical face size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price_cents: u64,
    pub description: String,
    pub image: String,
    #[serde(rename = "type")]
    pub kind: ProductKind,
    pub dimensions: Dimensions,
    pub stock: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    /// Images a customer must supply before the product can go in the cart.
    pub fn required_images(&self) -> usize {
        required_images(&self.id)
    }

    /// Face aspect ratio; falls back to square for degenerate sizes.
    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::new(self.dimensions.width, self.dimensions.height)
            .unwrap_or_else(AspectRatio::square)
    }

    /// Pixel output size for one face under `config`.
    pub fn render_target(&self, config: &PipelineConfig) -> RenderTarget {
        config.render_target(self.dimensions.width, self.dimensions.height)
    }

    pub fn is_puzzle(&self) -> bool {
        self.kind == ProductKind::Puzzle
    }
}

/// Images required for a product id. Unknown ids take a single image.
pub fn required_images(product_id: &str) -> usize {
    match product_id {
        "set-of-3" => 3,
        "set-of-6" => 6,
        "set-of-9" => 9,
        _ => 1,
    }
}

fn magnet_set(count: u32, price_cents: u64, timestamp: &str) -> Product {
    Product {
        id: format!("set-of-{}", count),
        name: format!("Custom Photo Magnets (Set of {})", count),
        price_cents,
        description: format!(
            "Transform your favorite memories into a beautiful set of {} custom photo magnets.",
            count
        ),
        image: "https://images.unsplash.com/photo-1583847268964-b28dc8f51f92?auto=format&fit=crop&q=80&w=800"
            .to_string(),
        kind: ProductKind::Set,
        dimensions: Dimensions {
            width: 50,
            height: 50,
        },
        stock: 100,
        created_at: timestamp.to_string(),
        updated_at: timestamp.to_string(),
    }
}

/// The storefront's built-in products, stamped with `timestamp`.
pub fn default_catalog(timestamp: &str) -> Vec<Product> {
    vec![
        magnet_set(3, 1499, timestamp),
        magnet_set(6, 2499, timestamp),
        magnet_set(9, 3499, timestamp),
        Product {
            id: "puzzle".to_string(),
            name: "Custom Photo Puzzle Magnet".to_string(),
            price_cents: 1999,
            description: "Create a unique 9-piece magnetic puzzle from your favorite photo."
                .to_string(),
            image: "https://images.unsplash.com/photo-1618842676088-c4d48a6a7c9d?auto=format&fit=crop&q=80&w=800"
                .to_string(),
            kind: ProductKind::Puzzle,
            dimensions: Dimensions {
                width: 150,
                height: 150,
            },
            stock: 100,
            created_at: timestamp.to_string(),
            updated_at: timestamp.to_string(),
        },
    ]
}

/// Look a product up by id.
pub fn find_product<'a>(products: &'a [Product], id: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2024-01-01T00:00:00.000Z";

    #[test]
    fn test_default_catalog() {
        let catalog = default_catalog(TS);
        let ids: Vec<&str> = catalog.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["set-of-3", "set-of-6", "set-of-9", "puzzle"]);

        let prices: Vec<u64> = catalog.iter().map(|p| p.price_cents).collect();
        assert_eq!(prices, [1499, 2499, 3499, 1999]);
    }

    #[test]
    fn test_required_images() {
        assert_eq!(required_images("set-of-3"), 3);
        assert_eq!(required_images("set-of-6"), 6);
        assert_eq!(required_images("set-of-9"), 9);
        assert_eq!(required_images("puzzle"), 1);
        assert_eq!(required_images("mystery"), 1);
    }

    #[test]
    fn test_puzzle_product() {
        let catalog = default_catalog(TS);
        let puzzle = find_product(&catalog, "puzzle").unwrap();
        assert!(puzzle.is_puzzle());
        assert_eq!(puzzle.required_images(), 1);
        assert_eq!(puzzle.aspect_ratio(), AspectRatio::square());

        let target = puzzle.render_target(&PipelineConfig::default());
        assert_eq!((target.pixel_width(), target.pixel_height()), (300, 300));
    }

    #[test]
    fn test_find_missing_product() {
        assert!(find_product(&default_catalog(TS), "set-of-12").is_none());
    }

    #[test]
    fn test_product_json_shape() {
        let product = &default_catalog(TS)[0];
        let json = serde_json::to_value(product).unwrap();
        assert_eq!(json["type"], "set");
        assert_eq!(json["priceCents"], 1499);
        assert_eq!(json["dimensions"]["width"], 50);
        assert_eq!(json["createdAt"], TS);
    }
}
