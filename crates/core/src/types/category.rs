//! The closed category taxonomy.
//!
//! Stored records always carry a concrete [`Category`]. The query-only `all`
//! sentinel lives in [`CategoryFilter`] and can never reach a stored record:
//! deserializing `"all"` into a `Category` fails.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a known category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryParseError {
    /// `all` is a query sentinel, not a storable category.
    #[error("'all' is a query filter, not a product category")]
    Sentinel,
    /// The value is not part of the taxonomy.
    #[error("unknown category: {0}")]
    Unknown(String),
}

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cameras,
    Climatisation,
    Securite,
    Solaire,
    Pc,
    Ordinateurs,
    Incendie,
    Electronique,
}

impl Category {
    /// Every category, in taxonomy order.
    pub const ALL: [Self; 8] = [
        Self::Cameras,
        Self::Climatisation,
        Self::Securite,
        Self::Solaire,
        Self::Pc,
        Self::Ordinateurs,
        Self::Incendie,
        Self::Electronique,
    ];

    /// Wire name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cameras => "cameras",
            Self::Climatisation => "climatisation",
            Self::Securite => "securite",
            Self::Solaire => "solaire",
            Self::Pc => "pc",
            Self::Ordinateurs => "ordinateurs",
            Self::Incendie => "incendie",
            Self::Electronique => "electronique",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized == CategoryFilter::ALL_SENTINEL {
            return Err(CategoryParseError::Sentinel);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| CategoryParseError::Unknown(s.to_owned()))
    }
}

/// Category filter for read queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    /// No category restriction.
    #[default]
    All,
    /// Only records of this category.
    Only(Category),
}

impl CategoryFilter {
    /// The query sentinel meaning "every category".
    pub const ALL_SENTINEL: &'static str = "all";

    /// The concrete category, if any.
    #[must_use]
    pub const fn category(self) -> Option<Category> {
        match self {
            Self::All => None,
            Self::Only(c) => Some(c),
        }
    }

    /// Whether a record of `category` passes this filter.
    #[must_use]
    pub fn accepts(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(c) => c == category,
        }
    }

    /// Parse an optional query parameter; absent or empty means `All`.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryParseError::Unknown`] for values outside the taxonomy.
    pub fn from_param(param: Option<&str>) -> Result<Self, CategoryParseError> {
        match param.map(str::trim) {
            None | Some("") => Ok(Self::All),
            Some(s) => s.parse(),
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        Self::Only(category)
    }
}

impl From<Option<Category>> for CategoryFilter {
    fn from(category: Option<Category>) -> Self {
        category.map_or(Self::All, Self::Only)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL_SENTINEL),
            Self::Only(c) => c.fmt(f),
        }
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Category>() {
            Ok(c) => Ok(Self::Only(c)),
            Err(CategoryParseError::Sentinel) => Ok(Self::All),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_category() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_sentinel_rejected_as_category() {
        assert_eq!("all".parse::<Category>(), Err(CategoryParseError::Sentinel));
        assert!(serde_json::from_str::<Category>("\"all\"").is_err());
    }

    #[test]
    fn test_unknown_category() {
        assert!(matches!(
            "drones".parse::<Category>(),
            Err(CategoryParseError::Unknown(_))
        ));
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Cameras".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Cameras)
        );
        assert_eq!(CategoryFilter::from_param(None).unwrap(), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from_param(Some("  ")).unwrap(),
            CategoryFilter::All
        );
        assert!(CategoryFilter::from_param(Some("drones")).is_err());
    }

    #[test]
    fn test_filter_accepts() {
        assert!(CategoryFilter::All.accepts(Category::Pc));
        assert!(CategoryFilter::Only(Category::Pc).accepts(Category::Pc));
        assert!(!CategoryFilter::Only(Category::Pc).accepts(Category::Ordinateurs));
    }
}
