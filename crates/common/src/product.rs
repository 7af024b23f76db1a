use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest product name accepted, in characters.
pub const MAX_PRODUCT_NAME_LEN: usize = 255;

/// Returned when a product name cannot be used as a stock key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidProductName {
    #[error("Product name must not be empty")]
    Empty,

    #[error(
        "Product name is {length} characters long, the limit is {}",
        MAX_PRODUCT_NAME_LEN
    )]
    TooLong { length: usize },
}

/// Product key of a stock row.
///
/// Names are trimmed on construction and compared case-sensitively, so
/// `" Widget "` and `"Widget"` address the same row while `"widget"` does not.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductName(String);

impl ProductName {
    /// Trims `name` and rejects it if nothing is left or it is longer than
    /// [`MAX_PRODUCT_NAME_LEN`] characters.
    pub fn parse(name: impl AsRef<str>) -> Result<Self, InvalidProductName> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InvalidProductName::Empty);
        }
        let length = trimmed.chars().count();
        if length > MAX_PRODUCT_NAME_LEN {
            return Err(InvalidProductName::TooLong { length });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the product name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ProductName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ProductName::parse(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for ProductName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ProductName {
    type Error = InvalidProductName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ProductName {
    type Error = InvalidProductName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for ProductName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let name = ProductName::parse("  Widget  ").unwrap();
        assert_eq!(name.as_str(), "Widget");
        assert_eq!(name, ProductName::parse("Widget").unwrap());
    }

    #[test]
    fn parse_rejects_blank_names() {
        assert_eq!(ProductName::parse(""), Err(InvalidProductName::Empty));
        assert_eq!(ProductName::parse("   \t"), Err(InvalidProductName::Empty));
    }

    #[test]
    fn parse_enforces_length_limit_in_characters() {
        let longest = "é".repeat(MAX_PRODUCT_NAME_LEN);
        assert_eq!(ProductName::parse(&longest).unwrap().as_str(), longest);

        let too_long = "x".repeat(MAX_PRODUCT_NAME_LEN + 1);
        assert_eq!(
            ProductName::parse(&too_long),
            Err(InvalidProductName::TooLong { length: 256 })
        );
        // Surrounding whitespace does not count.
        assert!(ProductName::parse(format!("  {}  ", "x".repeat(MAX_PRODUCT_NAME_LEN))).is_ok());
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_ne!(
            ProductName::parse("Widget").unwrap(),
            ProductName::parse("widget").unwrap()
        );
    }

    #[test]
    fn deserialize_applies_same_rules() {
        let name: ProductName = serde_json::from_str("\" Bolt \"").unwrap();
        assert_eq!(name.as_str(), "Bolt");
        assert!(serde_json::from_str::<ProductName>("\"  \"").is_err());
    }
}
