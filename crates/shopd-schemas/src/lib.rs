//! Domain types shared across the storefront crates.
//!
//! Everything here is plain data: serde for the wire, `sqlx` derives for the
//! row mappings. No business logic beyond the order transition graph, which
//! lives next to `OrderStatus` so every crate agrees on it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role. Registration always produces `User`; only an existing admin
/// (or the CLI seed command) can grant `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

// ---------------------------------------------------------------------------
// OrderStatus — the transition graph
// ---------------------------------------------------------------------------

/// Order lifecycle state.
///
/// `pending` is the initial state. The user actor may only move
/// `pending -> cancelled`; admins overwrite the status unconditionally
/// (observed behavior of the original system, preserved as-is).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a user-initiated cancellation is allowed from this state.
    /// Only `pending` qualifies; `shipped`, `delivered` and `cancelled`
    /// are all refusals (the second cancel of the same order lands here).
    pub fn user_can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Terminal states have no user-reachable successor.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// PaymentMethod
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    Cod,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Full user row, password hash included. Internal to the backend; never
/// serialized into a response — convert to [`UserProfile`] first.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// User representation for API responses: everything except the hash.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        UserProfile {
            user_id: u.user_id,
            email: u.email,
            name: u.name,
            gender: u.gender,
            age: u.age,
            phone_number: u.phone_number,
            address: u.address,
            profile_picture: u.profile_picture,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Product + reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: i32,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Review row as stored. Append-only: no update or delete path exists.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub review_id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Review with the reviewer's email resolved, as returned by catalog reads.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewView {
    pub review_id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Product with its reviews embedded — the shape of `GET /api/products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductWithReviews {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<ReviewView>,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// Shipping address embedded in an order (JSONB column). All fields are
/// required except the second address line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShippingAddress {
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Line-item snapshot frozen at checkout. `product_id` is a soft reference:
/// deleting the product nulls it but the name/price snapshot stays intact.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub total: Decimal,
    pub status: OrderStatus,
    #[sqlx(json)]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

/// Order with its item snapshots embedded — the shape of `GET /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Admin order listing: owner email resolved alongside the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOrderView {
    #[serde(flatten)]
    pub order: Order,
    pub user_email: String,
    pub items: Vec<OrderItem>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_cancel_allowed_only_from_pending() {
        assert!(OrderStatus::Pending.user_can_cancel());
        assert!(!OrderStatus::Shipped.user_can_cancel());
        assert!(!OrderStatus::Delivered.user_can_cancel());
        assert!(!OrderStatus::Cancelled.user_can_cancel());
    }

    #[test]
    fn delivered_and_cancelled_are_terminal() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn order_status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, r#""cancelled""#);
        let back: OrderStatus = serde_json::from_str(r#""shipped""#).unwrap();
        assert_eq!(back, OrderStatus::Shipped);
    }

    #[test]
    fn payment_method_uses_snake_case_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            r#""credit_card""#
        );
        let back: PaymentMethod = serde_json::from_str(r#""cod""#).unwrap();
        assert_eq!(back, PaymentMethod::Cod);
    }

    #[test]
    fn profile_conversion_drops_password_hash() {
        let user = User {
            user_id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            name: "A".to_string(),
            gender: None,
            age: Some(30),
            phone_number: None,
            address: None,
            profile_picture: None,
            role: Role::User,
            created_at: Utc::now(),
        };
        let profile = UserProfile::from(user.clone());
        assert_eq!(profile.email, user.email);

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn shipping_address_requires_line1_but_not_line2() {
        let ok: Result<ShippingAddress, _> = serde_json::from_str(
            r#"{"address_line1":"1 Main St","city":"Springfield","state":"IL",
                "postal_code":"62701","country":"US"}"#,
        );
        assert!(ok.is_ok());

        let missing_line1: Result<ShippingAddress, _> = serde_json::from_str(
            r#"{"city":"Springfield","state":"IL","postal_code":"62701","country":"US"}"#,
        );
        assert!(missing_line1.is_err());
    }

    #[test]
    fn shipping_address_rejects_unknown_fields() {
        let extra: Result<ShippingAddress, _> = serde_json::from_str(
            r#"{"address_line1":"1 Main St","city":"Springfield","state":"IL",
                "postal_code":"62701","country":"US","gift_wrap":true}"#,
        );
        assert!(extra.is_err());
    }
}
