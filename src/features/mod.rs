//! Order features and their closed vocabularies.
//!
//! Raw form strings never reach the estimator: they are canonicalized by the
//! [`FeatureNormalizer`] into one of the enums below, and anything that does
//! not map is rejected.

mod normalizer;

pub use normalizer::{FeatureNormalizer, Lexicon, SynonymOverrides, SynonymTable, normalize};

use std::fmt;

use serde::{Deserialize, Serialize};

/// The attribute a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ProductCategory,
    CustomerLocation,
    ShippingMethod,
}

impl Field {
    /// Snake-case name, as used in reference data and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ProductCategory => "product_category",
            Field::CustomerLocation => "customer_location",
            Field::ShippingMethod => "shipping_method",
        }
    }

    /// Canonical names accepted for this field, for re-prompting.
    pub fn accepted_values(&self) -> Vec<&'static str> {
        match self {
            Field::ProductCategory => ProductCategory::ALL.iter().map(|v| v.as_str()).collect(),
            Field::CustomerLocation => CustomerLocation::ALL.iter().map(|v| v.as_str()).collect(),
            Field::ShippingMethod => ShippingMethod::ALL.iter().map(|v| v.as_str()).collect(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed set of canonical values for one attribute.
pub trait Vocabulary: Copy + Eq + Send + Sync + 'static {
    /// The attribute this vocabulary describes.
    const FIELD: Field;

    /// Every member, in display order.
    fn all() -> &'static [Self];

    /// Canonical display name.
    fn as_str(&self) -> &'static str;
}

/// What is being shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductCategory {
    Electronics,
    Clothing,
    Fragile,
    Large,
    Other,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 5] = [
        ProductCategory::Electronics,
        ProductCategory::Clothing,
        ProductCategory::Fragile,
        ProductCategory::Large,
        ProductCategory::Other,
    ];
}

impl Vocabulary for ProductCategory {
    const FIELD: Field = Field::ProductCategory;

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Electronics => "Electronics",
            ProductCategory::Clothing => "Clothing",
            ProductCategory::Fragile => "Fragile",
            ProductCategory::Large => "Large",
            ProductCategory::Other => "Other",
        }
    }
}

/// Where the customer is, relative to the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerLocation {
    Local,
    Regional,
    Remote,
    International,
}

impl CustomerLocation {
    pub const ALL: [CustomerLocation; 4] = [
        CustomerLocation::Local,
        CustomerLocation::Regional,
        CustomerLocation::Remote,
        CustomerLocation::International,
    ];
}

impl Vocabulary for CustomerLocation {
    const FIELD: Field = Field::CustomerLocation;

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn as_str(&self) -> &'static str {
        match self {
            CustomerLocation::Local => "Local",
            CustomerLocation::Regional => "Regional",
            CustomerLocation::Remote => "Remote",
            CustomerLocation::International => "International",
        }
    }
}

/// How the order is shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShippingMethod {
    Express,
    Standard,
    Economy,
}

impl ShippingMethod {
    pub const ALL: [ShippingMethod; 3] = [
        ShippingMethod::Express,
        ShippingMethod::Standard,
        ShippingMethod::Economy,
    ];
}

impl Vocabulary for ShippingMethod {
    const FIELD: Field = Field::ShippingMethod;

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Express => "Express",
            ShippingMethod::Standard => "Standard",
            ShippingMethod::Economy => "Economy",
        }
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(Vocabulary::as_str(self))
                }
            }
        )*
    };
}

display_via_as_str!(ProductCategory, CustomerLocation, ShippingMethod);

/// Normalized order attributes. Only ever built from canonical enum members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderFeatures {
    pub product_category: ProductCategory,
    pub customer_location: CustomerLocation,
    pub shipping_method: ShippingMethod,
}

impl OrderFeatures {
    pub fn new(
        product_category: ProductCategory,
        customer_location: CustomerLocation,
        shipping_method: ShippingMethod,
    ) -> Self {
        Self {
            product_category,
            customer_location,
            shipping_method,
        }
    }

    /// Every valid combination of the three vocabularies.
    pub fn all_combinations() -> impl Iterator<Item = OrderFeatures> {
        ProductCategory::ALL.into_iter().flat_map(|category| {
            CustomerLocation::ALL.into_iter().flat_map(move |location| {
                ShippingMethod::ALL
                    .into_iter()
                    .map(move |shipping| OrderFeatures::new(category, location, shipping))
            })
        })
    }
}

impl fmt::Display for OrderFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.product_category, self.customer_location, self.shipping_method
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_combinations_covers_every_triple() {
        assert_eq!(OrderFeatures::all_combinations().count(), 5 * 4 * 3);
    }

    #[test]
    fn test_accepted_values_lists_canonical_names() {
        assert_eq!(
            Field::ShippingMethod.accepted_values(),
            vec!["Express", "Standard", "Economy"]
        );
    }

    #[test]
    fn test_enum_serializes_as_canonical_name() {
        let json = serde_json::to_string(&CustomerLocation::International).unwrap();
        assert_eq!(json, "\"International\"");
        assert_eq!(Field::ProductCategory.to_string(), "product_category");
    }
}
