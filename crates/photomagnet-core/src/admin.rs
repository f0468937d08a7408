//! Admin back office: users, products and orders.
//!
//! Storage sits behind [`AdminRepository`] so the panel can run against a
//! backend or, as in tests and demos, [`InMemoryAdminRepository`].
//! Timestamps are opaque ISO-8601 strings supplied by the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartItem};
use crate::catalog::{Dimensions, Product, ProductKind};
use crate::checkout::{DeliveryDetails, OrderSummary};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} {id} already exists")]
    DuplicateId { kind: &'static str, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: String,
    pub last_login: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub total_cents: u64,
    pub status: OrderStatus,
    pub delivery_details: DeliveryDetails,
    pub created_at: String,
    pub updated_at: String,
}

impl Order {
    /// A pending order for a cart that has just been paid for.
    pub fn from_checkout(
        id: impl Into<String>,
        user_id: impl Into<String>,
        cart: &Cart,
        summary: &OrderSummary,
        delivery_details: DeliveryDetails,
        timestamp: &str,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            items: cart.items().to_vec(),
            total_cents: summary.total_cents,
            status: OrderStatus::Pending,
            delivery_details,
            created_at: timestamp.to_string(),
            updated_at: timestamp.to_string(),
        }
    }
}

/// Partial user edit; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub last_login: Option<String>,
}

impl UserUpdate {
    fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(last_login) = self.last_login {
            user.last_login = last_login;
        }
    }
}

/// Partial product edit; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price_cents: Option<u64>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ProductKind>,
    pub dimensions: Option<Dimensions>,
    pub stock: Option<u32>,
    pub updated_at: Option<String>,
}

impl ProductUpdate {
    fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price_cents) = self.price_cents {
            product.price_cents = price_cents;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(kind) = self.kind {
            product.kind = kind;
        }
        if let Some(dimensions) = self.dimensions {
            product.dimensions = dimensions;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(updated_at) = self.updated_at {
            product.updated_at = updated_at;
        }
    }
}

/// Dashboard headline numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_products: usize,
    pub total_orders: usize,
    pub pending_orders: usize,
    /// Sum of every order total, in minor units.
    pub revenue_cents: u64,
}

pub trait AdminRepository {
    fn users(&self) -> Result<Vec<User>, AdminError>;
    fn add_user(&mut self, user: User) -> Result<(), AdminError>;
    fn update_user(&mut self, id: &str, update: UserUpdate) -> Result<User, AdminError>;
    fn delete_user(&mut self, id: &str) -> Result<User, AdminError>;

    fn products(&self) -> Result<Vec<Product>, AdminError>;
    fn add_product(&mut self, product: Product) -> Result<(), AdminError>;
    fn update_product(&mut self, id: &str, update: ProductUpdate) -> Result<Product, AdminError>;
    fn delete_product(&mut self, id: &str) -> Result<Product, AdminError>;

    fn orders(&self) -> Result<Vec<Order>, AdminError>;
    fn add_order(&mut self, order: Order) -> Result<(), AdminError>;
    fn update_order_status(
        &mut self,
        id: &str,
        status: OrderStatus,
        timestamp: &str,
    ) -> Result<Order, AdminError>;

    /// Most recent orders first, at most `limit`.
    fn recent_orders(&self, limit: usize) -> Result<Vec<Order>, AdminError> {
        let mut orders = self.orders()?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit);
        Ok(orders)
    }

    fn stats(&self) -> Result<DashboardStats, AdminError> {
        let orders = self.orders()?;
        Ok(DashboardStats {
            total_users: self.users()?.len(),
            total_products: self.products()?.len(),
            total_orders: orders.len(),
            pending_orders: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .count(),
            revenue_cents: orders.iter().map(|o| o.total_cents).sum(),
        })
    }
}

fn not_found(kind: &'static str, id: &str) -> AdminError {
    AdminError::NotFound {
        kind,
        id: id.to_string(),
    }
}

/// Insert keyed records into a list, refusing duplicates.
fn insert<T>(
    records: &mut Vec<T>,
    record: T,
    kind: &'static str,
    id_of: impl Fn(&T) -> &str,
) -> Result<(), AdminError> {
    let id = id_of(&record);
    if records.iter().any(|r| id_of(r) == id) {
        return Err(AdminError::DuplicateId {
            kind,
            id: id.to_string(),
        });
    }
    log::info!("added {} {}", kind, id);
    records.push(record);
    Ok(())
}

fn remove<T>(
    records: &mut Vec<T>,
    id: &str,
    kind: &'static str,
    id_of: impl Fn(&T) -> &str,
) -> Result<T, AdminError> {
    let index = records
        .iter()
        .position(|r| id_of(r) == id)
        .ok_or_else(|| not_found(kind, id))?;
    log::info!("deleted {} {}", kind, id);
    Ok(records.remove(index))
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAdminRepository {
    users: Vec<User>,
    products: Vec<Product>,
    orders: Vec<Order>,
}

impl InMemoryAdminRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }
}

impl AdminRepository for InMemoryAdminRepository {
    fn users(&self) -> Result<Vec<User>, AdminError> {
        Ok(self.users.clone())
    }

    fn add_user(&mut self, user: User) -> Result<(), AdminError> {
        insert(&mut self.users, user, "user", |u| &u.id)
    }

    fn update_user(&mut self, id: &str, update: UserUpdate) -> Result<User, AdminError> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found("user", id))?;
        update.apply(user);
        Ok(user.clone())
    }

    fn delete_user(&mut self, id: &str) -> Result<User, AdminError> {
        remove(&mut self.users, id, "user", |u| &u.id)
    }

    fn products(&self) -> Result<Vec<Product>, AdminError> {
        Ok(self.products.clone())
    }

    fn add_product(&mut self, product: Product) -> Result<(), AdminError> {
        insert(&mut self.products, product, "product", |p| &p.id)
    }

    fn update_product(&mut self, id: &str, update: ProductUpdate) -> Result<Product, AdminError> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("product", id))?;
        update.apply(product);
        Ok(product.clone())
    }

    fn delete_product(&mut self, id: &str) -> Result<Product, AdminError> {
        remove(&mut self.products, id, "product", |p| &p.id)
    }

    fn orders(&self) -> Result<Vec<Order>, AdminError> {
        Ok(self.orders.clone())
    }

    fn add_order(&mut self, order: Order) -> Result<(), AdminError> {
        insert(&mut self.orders, order, "order", |o| &o.id)
    }

    fn update_order_status(
        &mut self,
        id: &str,
        status: OrderStatus,
        timestamp: &str,
    ) -> Result<Order, AdminError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| not_found("order", id))?;
        log::info!("order {} {:?} -> {:?}", id, order.status, status);
        order.status = status;
        order.updated_at = timestamp.to_string();
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            name: id.to_uppercase(),
            role,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            last_login: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn order(id: &str, total_cents: u64, created_at: &str) -> Order {
        Order {
            id: id.to_string(),
            user_id: "u1".to_string(),
            items: Vec::new(),
            total_cents,
            status: OrderStatus::Pending,
            delivery_details: DeliveryDetails::default(),
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_user_crud() {
        let mut repo = InMemoryAdminRepository::new();
        repo.add_user(user("u1", Role::User)).unwrap();
        repo.add_user(user("u2", Role::Admin)).unwrap();

        let updated = repo
            .update_user(
                "u1",
                UserUpdate {
                    role: Some(Role::Admin),
                    ..UserUpdate::default()
                },
            )
            .unwrap();
        assert!(updated.is_admin());
        assert_eq!(updated.email, "u1@example.com");

        let deleted = repo.delete_user("u2").unwrap();
        assert_eq!(deleted.id, "u2");
        assert_eq!(repo.users().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_and_missing_ids() {
        let mut repo = InMemoryAdminRepository::new();
        repo.add_user(user("u1", Role::User)).unwrap();
        assert_eq!(
            repo.add_user(user("u1", Role::Admin)),
            Err(AdminError::DuplicateId {
                kind: "user",
                id: "u1".to_string()
            })
        );
        let err = repo.delete_user("ghost").unwrap_err();
        assert_eq!(err.to_string(), "user ghost not found");
        assert!(repo.update_order_status("o9", OrderStatus::Shipped, "t").is_err());
    }

    #[test]
    fn test_product_update() {
        let mut repo = InMemoryAdminRepository::with_products(default_catalog("t0"));
        let product = repo
            .update_product(
                "set-of-3",
                ProductUpdate {
                    price_cents: Some(1299),
                    stock: Some(5),
                    updated_at: Some("t1".to_string()),
                    ..ProductUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(product.price_cents, 1299);
        assert_eq!(product.stock, 5);
        assert_eq!(product.created_at, "t0");
        assert_eq!(product.updated_at, "t1");

        repo.delete_product("puzzle").unwrap();
        assert_eq!(repo.products().unwrap().len(), 3);
    }

    #[test]
    fn test_order_status_and_stats() {
        let mut repo = InMemoryAdminRepository::with_products(default_catalog("t0"));
        repo.add_user(user("u1", Role::User)).unwrap();
        repo.add_order(order("o1", 1499, "2024-01-02")).unwrap();
        repo.add_order(order("o2", 2499, "2024-01-03")).unwrap();

        let shipped = repo
            .update_order_status("o1", OrderStatus::Shipped, "2024-01-04")
            .unwrap();
        assert_eq!(shipped.updated_at, "2024-01-04");

        let stats = repo.stats().unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_users: 1,
                total_products: 4,
                total_orders: 2,
                pending_orders: 1,
                revenue_cents: 3998,
            }
        );
    }

    #[test]
    fn test_recent_orders() {
        let mut repo = InMemoryAdminRepository::new();
        repo.add_order(order("o1", 100, "2024-01-01")).unwrap();
        repo.add_order(order("o2", 100, "2024-03-01")).unwrap();
        repo.add_order(order("o3", 100, "2024-02-01")).unwrap();

        let ids: Vec<String> = repo
            .recent_orders(2)
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, ["o2", "o3"]);
    }

    #[test]
    fn test_order_from_checkout() {
        let catalog = default_catalog("t0");
        let mut cart = Cart::new();
        cart.add_item(&catalog[3], vec!["data:image/jpeg;base64,AA==".to_string()])
            .unwrap();
        let summary = OrderSummary {
            subtotal_cents: 1999,
            discount_cents: 200,
            total_cents: 1799,
        };
        let order = Order::from_checkout("o1", "u1", &cart, &summary, DeliveryDetails::default(), "t1");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 1799);
        assert_eq!(order.items, cart.items());

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["userId"], "u1");
    }

    #[test]
    fn test_update_payload_from_json() {
        let update: UserUpdate = serde_json::from_str(r#"{"name":"New Name"}"#).unwrap();
        assert_eq!(update.name.as_deref(), Some("New Name"));
        assert!(update.role.is_none());
    }
}
