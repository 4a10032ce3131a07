//! The product record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Category, ProductId};

/// Errors found when checking a product against the data-model invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Product id is blank.
    #[error("product id cannot be empty")]
    EmptyId,
    /// Product name is blank.
    #[error("product {id}: name cannot be empty")]
    EmptyName {
        /// Offending product.
        id: ProductId,
    },
    /// Price is below zero.
    #[error("product {id}: price must be non-negative (got {price})")]
    NegativePrice {
        /// Offending product.
        id: ProductId,
        /// Rejected value.
        price: Decimal,
    },
    /// Original price is below zero.
    #[error("product {id}: original price must be non-negative (got {price})")]
    NegativeOriginalPrice {
        /// Offending product.
        id: ProductId,
        /// Rejected value.
        price: Decimal,
    },
    /// Promotion percentage is over 100.
    #[error("product {id}: promotion percentage must be between 0 and 100 (got {value})")]
    PromotionOutOfRange {
        /// Offending product.
        id: ProductId,
        /// Rejected value.
        value: u8,
    },
    /// Rating is outside `[0, 5]`.
    #[error("product {id}: rating must be between 0 and 5 (got {rating})")]
    RatingOutOfRange {
        /// Offending product.
        id: ProductId,
        /// Rejected value.
        rating: Decimal,
    },
    /// `mainImage` is not one of `images`.
    #[error("product {id}: main image is not part of the image list")]
    MainImageNotListed {
        /// Offending product.
        id: ProductId,
    },
}

/// A scalar specification value.
///
/// Specifications are an open map; there is no per-category schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for SpecValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Open string-keyed specification map.
pub type Specifications = BTreeMap<String, SpecValue>;

/// A catalog product.
///
/// Field names serialize in camelCase, which is also the remote document shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    pub category: Category,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_percentage: Option<u8>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub main_image: String,
    pub in_stock: bool,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub warranty: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

const fn default_true() -> bool {
    true
}

impl Product {
    /// Highest allowed rating.
    pub const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

    /// Check the record against the data-model invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName {
                id: self.id.clone(),
            });
        }
        if self.price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice {
                id: self.id.clone(),
                price: self.price,
            });
        }
        if let Some(original) = self.original_price
            && original < Decimal::ZERO
        {
            return Err(ValidationError::NegativeOriginalPrice {
                id: self.id.clone(),
                price: original,
            });
        }
        if let Some(value) = self.promotion_percentage
            && value > 100
        {
            return Err(ValidationError::PromotionOutOfRange {
                id: self.id.clone(),
                value,
            });
        }
        if self.rating < Decimal::ZERO || self.rating > Self::MAX_RATING {
            return Err(ValidationError::RatingOutOfRange {
                id: self.id.clone(),
                rating: self.rating,
            });
        }
        if !self.images.is_empty() && !self.images.contains(&self.main_image) {
            return Err(ValidationError::MainImageNotListed {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Whether the catalog-owned content of two records is the same.
    ///
    /// Timestamps are ignored: they are rewritten by every sync.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        let strip = |p: &Self| Self {
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            ..p.clone()
        };
        strip(self) == strip(other)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    /// A valid product for tests.
    pub(crate) fn sample(id: &str, category: Category) -> Product {
        let ts = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Product {
            id: ProductId::parse(id).unwrap(),
            name: format!("Product {id}"),
            brand: "Generic".to_owned(),
            description: "A product".to_owned(),
            short_description: String::new(),
            category,
            price: Decimal::new(10_000, 2),
            original_price: None,
            promotion_percentage: None,
            sku: id.to_uppercase(),
            images: vec!["/img/a.jpg".to_owned()],
            main_image: "/img/a.jpg".to_owned(),
            in_stock: true,
            stock_quantity: 3,
            specifications: Specifications::new(),
            features: Vec::new(),
            tags: Vec::new(),
            rating: Decimal::new(45, 1),
            review_count: 12,
            warranty: "1 an".to_owned(),
            created_at: ts,
            updated_at: ts,
            is_active: true,
            is_featured: false,
        }
    }

    #[test]
    fn test_valid_sample() {
        assert!(sample("p-1", Category::Pc).validate().is_ok());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut p = sample("p-1", Category::Pc);
        p.price = Decimal::new(-1, 0);
        assert!(matches!(
            p.validate(),
            Err(ValidationError::NegativePrice { .. })
        ));
    }

    #[test]
    fn test_rating_bounds() {
        let mut p = sample("p-1", Category::Pc);
        p.rating = Decimal::new(5, 0);
        assert!(p.validate().is_ok());
        p.rating = Decimal::new(51, 1);
        assert!(matches!(
            p.validate(),
            Err(ValidationError::RatingOutOfRange { .. })
        ));
    }

    #[test]
    fn test_promotion_bounds() {
        let mut p = sample("p-1", Category::Pc);
        p.promotion_percentage = Some(100);
        assert!(p.validate().is_ok());
        p.promotion_percentage = Some(101);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_main_image_must_be_listed() {
        let mut p = sample("p-1", Category::Pc);
        p.main_image = "/img/other.jpg".to_owned();
        assert!(matches!(
            p.validate(),
            Err(ValidationError::MainImageNotListed { .. })
        ));
    }

    #[test]
    fn test_same_content_ignores_timestamps() {
        let a = sample("p-1", Category::Pc);
        let mut b = a.clone();
        b.updated_at = Utc::now();
        assert!(a.same_content(&b));
        b.stock_quantity = 99;
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_price_serializes_exactly() {
        let mut p = sample("hik-001", Category::Cameras);
        p.price = Decimal::new(189_999, 2);
        let json = serde_json::to_string(&p).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back.price, Decimal::new(189_999, 2));
        assert_eq!(back.price.to_string(), "1899.99");
    }

    #[test]
    fn test_specifications_accept_scalars() {
        let json = r#"{"resolution":"4K","channels":8,"poe":true}"#;
        let specs: Specifications = serde_json::from_str(json).unwrap();
        assert_eq!(specs.get("poe"), Some(&SpecValue::Flag(true)));
        assert_eq!(specs.get("resolution"), Some(&SpecValue::Text("4K".into())));
        assert!(matches!(specs.get("channels"), Some(SpecValue::Number(_))));
    }
}
