//! Text matching shared by every search path.
//!
//! A product matches when the lowercased term is a substring of its name,
//! description, brand, any tag or any feature. There is no tokenization and
//! no ranking; results keep the order of the input list.

use crate::types::Product;

/// A normalized search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Normalize a raw term. Returns `None` for blank input.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    /// The normalized term.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `product` contains this term in any searchable field.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let hit = |text: &str| text.to_lowercase().contains(&self.0);

        hit(&product.name)
            || hit(&product.description)
            || hit(&product.brand)
            || product.tags.iter().any(|t| hit(t))
            || product.features.iter().any(|f| hit(f))
    }
}

/// Filter `products` down to those matching `raw_term`, keeping order.
///
/// A blank term matches nothing.
#[must_use]
pub fn filter_text<'a, I>(products: I, raw_term: &str) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    let Some(term) = SearchTerm::new(raw_term) else {
        return Vec::new();
    };
    products.into_iter().filter(|p| term.matches(p)).collect()
}
