//! Product listings owned by merchants.

mod service;

pub use service::{ProductListing, ProductService};

use chrono::{DateTime, Utc};
use common::DocumentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::Entity;
use crate::value_objects::{Money, ProductId, UserId};

/// Brand used when a listing names none.
pub const DEFAULT_BRAND: &str = "Generic";

/// Errors raised by product validation.
#[derive(Debug, Error)]
pub enum ProductError {
    /// A required field is absent or empty.
    #[error("Name, description, price, and quantity are required")]
    MissingFields,

    /// Price is zero or negative.
    #[error("Price must be greater than 0")]
    InvalidPrice { price: i64 },

    /// Stock is negative.
    #[error("Quantity cannot be negative")]
    NegativeQuantity { quantity: i64 },

    /// Stock is above the largest storable quantity.
    #[error("Quantity cannot exceed {max}")]
    QuantityTooLarge { quantity: i64, max: u32 },

    /// Category is outside the closed list.
    #[error("Invalid category: {0}")]
    UnknownCategory(String),
}

/// The closed list of product categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Clothing,
    #[serde(rename = "Home & Garden")]
    HomeAndGarden,
    Books,
    #[serde(rename = "Sports & Outdoors")]
    SportsAndOutdoors,
    #[serde(rename = "Health & Beauty")]
    HealthAndBeauty,
    #[serde(rename = "Toys & Games")]
    ToysAndGames,
    Automotive,
    #[serde(rename = "Food & Beverages")]
    FoodAndBeverages,
    #[serde(rename = "Office Supplies")]
    OfficeSupplies,
    #[default]
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 11] = [
        Category::Electronics,
        Category::Clothing,
        Category::HomeAndGarden,
        Category::Books,
        Category::SportsAndOutdoors,
        Category::HealthAndBeauty,
        Category::ToysAndGames,
        Category::Automotive,
        Category::FoodAndBeverages,
        Category::OfficeSupplies,
        Category::Other,
    ];

    /// Returns the display name, which is also the wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::HomeAndGarden => "Home & Garden",
            Category::Books => "Books",
            Category::SportsAndOutdoors => "Sports & Outdoors",
            Category::HealthAndBeauty => "Health & Beauty",
            Category::ToysAndGames => "Toys & Games",
            Category::Automotive => "Automotive",
            Category::FoodAndBeverages => "Food & Beverages",
            Category::OfficeSupplies => "Office Supplies",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProductError::UnknownCategory(s.to_string()))
    }
}

/// A product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    /// Units in stock. Decremented by checkout, restored by cancellation.
    pub quantity: u32,
    pub images: Vec<String>,
    pub brand: String,
    pub category: Category,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns true if `user` owns this listing.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// Filter matching every product of `owner`.
    pub fn owner_filter(owner: UserId) -> serde_json::Value {
        serde_json::json!({ "owner": owner })
    }
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";
    const NAME: &'static str = "Product";

    fn document_id(&self) -> DocumentId {
        self.id.into()
    }
}

/// Product fields as submitted by a merchant, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub quantity: u32,
    pub brand: String,
    pub category: Category,
    pub images: Option<Vec<String>>,
}

impl ProductDraft {
    /// Checks required fields and ranges, filling brand and category defaults.
    pub fn validate(self) -> Result<ValidProduct, ProductError> {
        let name = self.name.filter(|v| !v.trim().is_empty());
        let description = self.description.filter(|v| !v.trim().is_empty());
        let (Some(name), Some(description), Some(price), Some(quantity)) =
            (name, description, self.price, self.quantity)
        else {
            return Err(ProductError::MissingFields);
        };

        if price <= 0 {
            return Err(ProductError::InvalidPrice { price });
        }
        if quantity < 0 {
            return Err(ProductError::NegativeQuantity { quantity });
        }
        let quantity = u32::try_from(quantity).map_err(|_| ProductError::QuantityTooLarge {
            quantity,
            max: u32::MAX,
        })?;

        let category = match self.category.as_deref() {
            None | Some("") => Category::default(),
            Some(c) => c.parse()?,
        };

        Ok(ValidProduct {
            name,
            description,
            price: Money::from_cents(price),
            quantity,
            brand: self
                .brand
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| DEFAULT_BRAND.to_string()),
            category,
            images: self.images,
        })
    }
}

/// Product fields shown next to cart and order lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub images: Vec<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: product.quantity,
            images: product.images.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: Some("Lamp".to_string()),
            description: Some("A desk lamp".to_string()),
            price: Some(2000),
            quantity: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn validate_fills_defaults() {
        let valid = draft().validate().unwrap();

        assert_eq!(valid.brand, DEFAULT_BRAND);
        assert_eq!(valid.category, Category::Other);
        assert_eq!(valid.price, Money::from_cents(2000));
        assert!(valid.images.is_none());
    }

    #[test]
    fn validate_requires_fields() {
        let mut missing_name = draft();
        missing_name.name = Some("  ".to_string());
        let mut missing_quantity = draft();
        missing_quantity.quantity = None;

        assert!(matches!(missing_name.validate(), Err(ProductError::MissingFields)));
        assert!(matches!(
            missing_quantity.validate(),
            Err(ProductError::MissingFields)
        ));
    }

    #[test]
    fn validate_checks_ranges() {
        let mut free = draft();
        free.price = Some(0);
        let mut negative = draft();
        negative.quantity = Some(-1);
        let mut zero_stock = draft();
        zero_stock.quantity = Some(0);

        assert!(matches!(free.validate(), Err(ProductError::InvalidPrice { price: 0 })));
        assert!(matches!(
            negative.validate(),
            Err(ProductError::NegativeQuantity { quantity: -1 })
        ));
        assert_eq!(zero_stock.validate().unwrap().quantity, 0);
    }

    #[test]
    fn validate_caps_quantity() {
        let mut full = draft();
        full.quantity = Some(i64::from(u32::MAX));
        let mut over = draft();
        over.quantity = Some(i64::from(u32::MAX) + 1);

        assert_eq!(full.validate().unwrap().quantity, u32::MAX);
        let err = over.validate().unwrap_err();
        assert!(matches!(err, ProductError::QuantityTooLarge { .. }));
        assert_eq!(err.to_string(), "Quantity cannot exceed 4294967295");
    }

    #[test]
    fn category_wire_names_round_trip() {
        for category in Category::ALL {
            let json = serde_json::to_value(category).unwrap();
            assert_eq!(json, category.as_str());
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("Weapons".parse::<Category>().is_err());
    }
}
