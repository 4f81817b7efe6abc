//! Cart lines and their persisted form.

use gaojie_core::{Amount, ProductId};
use serde::{Deserialize, Serialize};

/// One product in the cart.
///
/// Field names on the wire match the persisted cart entry
/// (`{id, name, price, image, slug, quantity}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Amount,
    pub quantity: u32,
    #[serde(rename = "image", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub const fn line_total(&self) -> Amount {
        self.unit_price.times(self.quantity)
    }
}

/// What a product page hands to the cart when adding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Amount,
    pub image_url: Option<String>,
    pub slug: Option<String>,
}

impl ProductRef {
    pub(crate) fn into_line(self, quantity: u32) -> CartLine {
        CartLine {
            id: self.id,
            name: self.name,
            unit_price: self.unit_price,
            quantity,
            image_url: self.image_url,
            slug: self.slug,
        }
    }
}

/// A persisted line before its quantity is checked.
#[derive(Deserialize)]
struct StoredLine {
    id: ProductId,
    #[serde(default)]
    name: String,
    price: Amount,
    quantity: i64,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    slug: Option<String>,
}

/// Decode the persisted cart entry.
///
/// Lines that fail to decode or carry a quantity below one are dropped with a
/// warning; the rest are returned in stored order.
///
/// # Errors
///
/// Returns the JSON error when the entry is not an array at all.
pub fn decode_lines(raw: &str) -> Result<Vec<CartLine>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut lines = Vec::with_capacity(values.len());

    for value in values {
        let stored: StoredLine = match serde_json::from_value(value) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable cart line");
                continue;
            }
        };

        let Ok(quantity) = u32::try_from(stored.quantity) else {
            tracing::warn!(product_id = %stored.id, quantity = stored.quantity, "Dropping cart line with invalid quantity");
            continue;
        };
        if quantity == 0 {
            tracing::warn!(product_id = %stored.id, "Dropping cart line with zero quantity");
            continue;
        }

        lines.push(CartLine {
            id: stored.id,
            name: stored.name,
            unit_price: stored.price,
            quantity,
            image_url: stored.image,
            slug: stored.slug,
        });
    }

    Ok(lines)
}

/// Encode lines for persistence.
///
/// # Errors
///
/// Returns the JSON error if serialization fails.
pub fn encode_lines(lines: &[CartLine]) -> Result<String, serde_json::Error> {
    serde_json::to_string(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_normalizes_numeric_ids() {
        let raw = r#"[{"id": 7, "name": "Serum", "price": 1290, "quantity": 2}]"#;
        let lines = decode_lines(raw).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id.as_str(), "7");
        assert_eq!(lines[0].unit_price, Amount::new(1290));
        assert_eq!(lines[0].line_total(), Amount::new(2580));
    }

    #[test]
    fn test_decode_drops_non_positive_quantities() {
        let raw = r#"[
            {"id": "1", "name": "A", "price": 100, "quantity": 0},
            {"id": "2", "name": "B", "price": 100, "quantity": -3},
            {"id": "3", "name": "C", "price": 100, "quantity": 1}
        ]"#;
        let lines = decode_lines(raw).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id.as_str(), "3");
    }

    #[test]
    fn test_decode_drops_malformed_lines() {
        let raw = r#"[{"id": "1", "price": "abc", "quantity": 1}, {"id": "2", "name": "B", "price": 50.0, "quantity": 1}]"#;
        let lines = decode_lines(raw).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].unit_price, Amount::new(50));
    }

    #[test]
    fn test_decode_rejects_non_array() {
        assert!(decode_lines("{not json").is_err());
        assert!(decode_lines(r#"{"id": 1}"#).is_err());
    }

    #[test]
    fn test_encode_uses_storage_field_names() {
        let line = CartLine {
            id: ProductId::from(5_u64),
            name: "Toner".to_string(),
            unit_price: Amount::new(590),
            quantity: 1,
            image_url: Some("/img/toner.jpg".to_string()),
            slug: None,
        };
        let encoded = encode_lines(&[line]).unwrap();
        assert_eq!(
            encoded,
            r#"[{"id":"5","name":"Toner","price":590,"quantity":1,"image":"/img/toner.jpg"}]"#
        );
    }
}
