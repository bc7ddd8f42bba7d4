//! Domain types for the catalog and basket with strong typing.
//!
//! Entity ids are wrapped in newtypes so a product id cannot be passed where a
//! basket item id is expected. Prices are kept in integer cents internally and
//! only become decimals at the API edge.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest spiciness level a product can carry. The lowest is 0.
pub const MAX_SPICINESS: i32 = 4;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_newtype!(
    /// Unique identifier for a catalog product.
    ProductId
);

id_newtype!(
    /// Unique identifier for a catalog category.
    CategoryId
);

id_newtype!(
    /// Unique identifier for a single line in a user's basket.
    BasketItemId
);

/// The fixed set of menu sections a category can represent.
///
/// Serialized with the variant name, e.g. `"ChickenDishes"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryType {
    Salads,
    Soups,
    ChickenDishes,
    BeefDishes,
    SeafoodDishes,
    VegetableDishes,
    BitsAndBites,
    OnTheSide,
}

impl CategoryType {
    /// All variants in seed order; the seeded category id is the index + 1.
    pub const ALL: [Self; 8] = [
        Self::Salads,
        Self::Soups,
        Self::ChickenDishes,
        Self::BeefDishes,
        Self::SeafoodDishes,
        Self::VegetableDishes,
        Self::BitsAndBites,
        Self::OnTheSide,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Salads => "Salads",
            Self::Soups => "Soups",
            Self::ChickenDishes => "ChickenDishes",
            Self::BeefDishes => "BeefDishes",
            Self::SeafoodDishes => "SeafoodDishes",
            Self::VegetableDishes => "VegetableDishes",
            Self::BitsAndBites => "BitsAndBites",
            Self::OnTheSide => "OnTheSide",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown category type: {s}"))
    }
}

/// A strictly positive amount of money with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    /// Builds a price from minor units. Returns `None` unless `cents > 0`.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Option<Self> {
        if cents > 0 { Some(Self(cents)) } else { None }
    }

    /// Converts a decimal amount such as `12.99`.
    ///
    /// Returns `None` for zero, negative, sub-cent or out-of-range amounts.
    #[must_use]
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        let amount = amount.normalize();
        if amount.scale() > 2 {
            return None;
        }
        let cents = amount.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()?;
        Self::from_cents(cents)
    }

    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_conversions() {
        let id = ProductId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(ProductId::from(42), id);
    }

    #[test]
    fn id_serializes_as_plain_number() {
        let json = serde_json::to_string(&BasketItemId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: BasketItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BasketItemId::new(7));
    }

    #[test]
    fn category_type_parses_case_insensitively() {
        assert_eq!(
            "chickendishes".parse::<CategoryType>(),
            Ok(CategoryType::ChickenDishes)
        );
        assert_eq!(" Soups ".parse::<CategoryType>(), Ok(CategoryType::Soups));
        assert!("Desserts".parse::<CategoryType>().is_err());
    }

    #[test]
    fn category_type_serializes_with_variant_name() {
        let json = serde_json::to_string(&CategoryType::BitsAndBites).unwrap();
        assert_eq!(json, "\"BitsAndBites\"");
        for category in CategoryType::ALL {
            assert_eq!(category.as_str().parse::<CategoryType>(), Ok(category));
        }
    }

    #[test]
    fn price_accepts_two_decimal_places() {
        let price = Price::from_decimal(Decimal::new(1299, 2)).unwrap();
        assert_eq!(price.cents(), 1299);
        assert_eq!(price.to_decimal(), Decimal::new(1299, 2));
        assert_eq!(price.to_string(), "12.99");

        let whole = Price::from_decimal(Decimal::new(5, 0)).unwrap();
        assert_eq!(whole.cents(), 500);

        // Trailing zeros beyond the second place are fine.
        let padded = Price::from_decimal(Decimal::new(12_990, 3)).unwrap();
        assert_eq!(padded.cents(), 1299);
    }

    #[test]
    fn price_rejects_non_positive_and_sub_cent_amounts() {
        assert!(Price::from_decimal(Decimal::ZERO).is_none());
        assert!(Price::from_decimal(Decimal::new(-100, 2)).is_none());
        assert!(Price::from_decimal(Decimal::new(12_999, 3)).is_none());
        assert!(Price::from_cents(0).is_none());
    }
}
