//! Cart line items.

use serde::{Deserialize, Serialize};

use super::{ProductId, Sats};

/// One product entry in a cart.
///
/// Serialized with the field names of the persisted cart slot
/// (`id`, `name`, `price_sats`, `image`, `quantity`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    #[serde(rename = "price_sats")]
    pub unit_price: Sats,
    /// Image file name, resolved against the product image base path when rendered.
    pub image: String,
    /// Always at least 1 while the item is in a cart.
    pub quantity: u32,
}

impl LineItem {
    /// Price of the whole line (`quantity × unit_price`).
    #[must_use]
    pub const fn line_total(&self) -> Sats {
        self.unit_price.times(self.quantity)
    }
}

/// An item being added to a cart.
///
/// `quantity` is optional; a missing or zero quantity counts as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub id: ProductId,
    pub name: String,
    #[serde(rename = "price_sats")]
    pub unit_price: Sats,
    pub image: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl NewLineItem {
    /// The quantity to add, defaulting to one.
    #[must_use]
    pub fn effective_quantity(&self) -> u32 {
        self.quantity.filter(|q| *q > 0).unwrap_or(1)
    }

    /// Convert into a line item carrying the effective quantity.
    #[must_use]
    pub fn into_line_item(self) -> LineItem {
        let quantity = self.effective_quantity();
        LineItem {
            id: self.id,
            name: self.name,
            unit_price: self.unit_price,
            image: self.image,
            quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(quantity: Option<u32>) -> NewLineItem {
        NewLineItem {
            id: ProductId::new("prod_001"),
            name: "Widget".to_string(),
            unit_price: Sats::new(1_000),
            image: "widget.jpg".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_effective_quantity_defaults_to_one() {
        assert_eq!(widget(None).effective_quantity(), 1);
        assert_eq!(widget(Some(0)).effective_quantity(), 1);
        assert_eq!(widget(Some(4)).effective_quantity(), 4);
    }

    #[test]
    fn test_line_item_uses_storage_field_names() {
        let item = widget(Some(2)).into_line_item();
        let json = serde_json::to_value(&item).unwrap_or_default();
        assert_eq!(json["price_sats"], 1_000);
        assert_eq!(json["quantity"], 2);
        assert_eq!(item.line_total(), Sats::new(2_000));
    }
}
