//! Backend API request and response types.

use chrono::NaiveDateTime;
use gaojie_core::{
    Amount, OrderId, OrderNumber, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};
use serde::{Deserialize, Serialize};

use crate::cart::{CartLine, CartTotals, ProductRef, ShippingMethod};

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price: Amount,
    #[serde(default)]
    pub original_price: Option<Amount>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub skin_type: Option<String>,
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_bestseller: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_on_sale: bool,
    #[serde(default = "default_true")]
    pub is_in_stock: bool,
    #[serde(default)]
    pub is_low_stock: bool,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub secondary_image: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

const fn default_true() -> bool {
    true
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            image_url: product.primary_image.clone(),
            slug: product.slug.clone(),
        }
    }
}

/// Pagination block of list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

/// A page of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub bestseller: Option<bool>,
    pub new: Option<bool>,
}

impl ProductQuery {
    /// Query pairs in a stable order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("category", category.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.trim().to_string()));
        }
        for (key, flag) in [
            ("featured", self.featured),
            ("bestseller", self.bestseller),
            ("new", self.new),
        ] {
            if flag == Some(true) {
                pairs.push((key, "true".to_string()));
            }
        }
        pairs
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsEnvelope {
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesEnvelope {
    pub categories: Vec<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// A backend user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub newsletter_subscribed: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Result of `GET /auth/check`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<User>,
}

/// Login body.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Registration body.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub newsletter: bool,
}

/// Profile update body. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newsletter: Option<bool>,
}

/// Password change body.
#[derive(Clone, Serialize, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordChange([REDACTED])")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: User,
}

/// Backend acknowledgement with a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// A line in the order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineItem {
    pub id: ProductId,
    pub name: String,
    pub quantity: u32,
    #[serde(rename = "price")]
    pub unit_price: Amount,
}

impl From<&CartLine> for OrderLineItem {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Shipping address sent with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    /// Province.
    pub state: String,
    pub postal_code: String,
    pub country: String,
    /// Normalized `+66…` form.
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// `POST /orders/create` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineItem>,
    pub shipping_info: ShippingInfo,
    pub shipping_method: ShippingMethod,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    pub notes: String,
    /// Client-side totals, for display only. The backend reprices.
    pub totals: CartTotals,
}

/// Shipping block of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderShipping {
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub formatted_address: Option<String>,
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Amount,
    pub total_price: Amount,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub status_display: Option<String>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    pub subtotal: Amount,
    #[serde(default)]
    pub tax_amount: Amount,
    #[serde(default)]
    pub shipping_amount: Amount,
    #[serde(default)]
    pub discount_amount: Amount,
    pub total_amount: Amount,
    #[serde(default)]
    pub item_count: u32,
    #[serde(default)]
    pub shipping: OrderShipping,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub order_notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// A page of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub order: Order,
}

/// The part of a freshly created order the storefront needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order_number: OrderNumber,
    #[serde(default)]
    pub total_amount: Option<Amount>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedOrderEnvelope {
    pub order: CreatedOrder,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_backend_json() {
        let json = r#"{
            "id": 12,
            "name": "Ginseng Serum",
            "slug": "ginseng-serum",
            "price": 1290.0,
            "original_price": null,
            "is_in_stock": true,
            "primary_image": "/static/img/serum.jpg",
            "tags": "serum,ginseng",
            "created_at": "2024-05-01T09:30:00.123456"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "12");
        assert_eq!(product.price, Amount::new(1290));
        assert!(product.created_at.is_some());

        let item = ProductRef::from(&product);
        assert_eq!(item.slug.as_deref(), Some("ginseng-serum"));
        assert_eq!(item.image_url.as_deref(), Some("/static/img/serum.jpg"));
    }

    #[test]
    fn test_product_query_pairs() {
        let query = ProductQuery {
            page: Some(2),
            category: Some("serums".to_string()),
            search: Some("  ".to_string()),
            bestseller: Some(true),
            new: Some(false),
            ..ProductQuery::default()
        };
        assert_eq!(
            query.pairs(),
            vec![
                ("page", "2".to_string()),
                ("category", "serums".to_string()),
                ("bestseller", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_order_from_backend_json() {
        let json = r#"{
            "id": 3,
            "order_number": "GJ20240501ABCD",
            "status": "pending",
            "payment_status": "pending",
            "subtotal": 2880.0,
            "tax_amount": 0.0,
            "shipping_amount": 0.0,
            "discount_amount": 0.0,
            "total_amount": 2880.0,
            "item_count": 2,
            "shipping": {"full_name": "Demo User", "city": "Bangkok"},
            "items": [{"product_name": "Serum", "quantity": 1, "unit_price": 1290.0, "total_price": 1290.0}],
            "billing": null
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_number.as_str(), "GJ20240501ABCD");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Amount::new(2880));
        assert_eq!(order.shipping.city.as_deref(), Some("Bangkok"));
        assert_eq!(order.items.len(), 1);
    }
}
