//! Canonicalization of raw form input into [`OrderFeatures`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use super::{CustomerLocation, Field, OrderFeatures, ProductCategory, ShippingMethod, Vocabulary};
use crate::error::NormalizationError;

/// Fold a raw value into a lookup key: trim, lowercase, treat `-`/`_` as
/// spaces and collapse runs of whitespace.
fn fold_key(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The member whose canonical name folds to `key`, if any.
fn canonical_owner<V: Vocabulary>(key: &str) -> Option<V> {
    V::all().iter().copied().find(|v| fold_key(v.as_str()) == key)
}

/// Synonym map for a single vocabulary. Keys are stored folded.
#[derive(Debug, Clone)]
pub struct Lexicon<V: Vocabulary> {
    entries: HashMap<String, V>,
}

impl<V: Vocabulary> Lexicon<V> {
    /// A lexicon that knows only the canonical names.
    pub fn canonical() -> Self {
        let entries = V::all()
            .iter()
            .map(|v| (fold_key(v.as_str()), *v))
            .collect();
        Self { entries }
    }

    /// Register a synonym. Later registrations win, except over canonical names.
    pub fn with_synonym(mut self, synonym: &str, value: V) -> Self {
        self.insert(synonym, value);
        self
    }

    /// Register a synonym in place. Returns `false` without changing
    /// anything if the key is blank or is another member's canonical name;
    /// canonical names always resolve to themselves.
    pub fn insert(&mut self, synonym: &str, value: V) -> bool {
        let key = fold_key(synonym);
        if key.is_empty() {
            return false;
        }
        if let Some(owner) = canonical_owner::<V>(&key)
            && owner != value
        {
            tracing::warn!(
                field = %V::FIELD,
                synonym = %synonym,
                canonical = owner.as_str(),
                "Ignoring synonym that would remap a canonical name"
            );
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    /// Resolve a raw value, or report which field it failed for.
    pub fn resolve(&self, raw: &str) -> Result<V, NormalizationError> {
        self.entries
            .get(&fold_key(raw))
            .copied()
            .ok_or_else(|| NormalizationError {
                field: V::FIELD,
                raw_value: raw.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extra synonyms supplied by reference data, keyed by attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymOverrides {
    pub product_category: HashMap<String, ProductCategory>,
    pub customer_location: HashMap<String, CustomerLocation>,
    pub shipping_method: HashMap<String, ShippingMethod>,
}

impl SynonymOverrides {
    /// Override keys that name a different member's canonical value, e.g.
    /// `"Express": "Economy"`. Such entries are never applied.
    pub fn canonical_conflicts(&self) -> Vec<(Field, String)> {
        let mut conflicts = Vec::new();
        collect_conflicts(&self.product_category, &mut conflicts);
        collect_conflicts(&self.customer_location, &mut conflicts);
        collect_conflicts(&self.shipping_method, &mut conflicts);
        conflicts
    }
}

fn collect_conflicts<V: Vocabulary>(map: &HashMap<String, V>, out: &mut Vec<(Field, String)>) {
    let mut keys: Vec<&String> = map
        .iter()
        .filter(|(synonym, value)| {
            canonical_owner::<V>(&fold_key(synonym)).is_some_and(|owner| owner != **value)
        })
        .map(|(synonym, _)| synonym)
        .collect();
    keys.sort();
    out.extend(keys.into_iter().map(|k| (V::FIELD, k.clone())));
}

/// The three lexicons used by the normalizer.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    pub product_category: Lexicon<ProductCategory>,
    pub customer_location: Lexicon<CustomerLocation>,
    pub shipping_method: Lexicon<ShippingMethod>,
}

impl SynonymTable {
    /// Built-in vocabulary: canonical names plus common spellings seen on
    /// order forms.
    pub fn builtin() -> Self {
        let product_category = Lexicon::canonical()
            .with_synonym("electronic", ProductCategory::Electronics)
            .with_synonym("electronics & gadgets", ProductCategory::Electronics)
            .with_synonym("gadgets", ProductCategory::Electronics)
            .with_synonym("apparel", ProductCategory::Clothing)
            .with_synonym("clothes", ProductCategory::Clothing)
            .with_synonym("fashion", ProductCategory::Clothing)
            .with_synonym("breakable", ProductCategory::Fragile)
            .with_synonym("glass", ProductCategory::Fragile)
            .with_synonym("oversized", ProductCategory::Large)
            .with_synonym("bulky", ProductCategory::Large)
            .with_synonym("furniture", ProductCategory::Large)
            .with_synonym("misc", ProductCategory::Other)
            .with_synonym("miscellaneous", ProductCategory::Other)
            .with_synonym("general", ProductCategory::Other);

        let customer_location = Lexicon::canonical()
            .with_synonym("usa local", CustomerLocation::Local)
            .with_synonym("same city", CustomerLocation::Local)
            .with_synonym("domestic local", CustomerLocation::Local)
            .with_synonym("region", CustomerLocation::Regional)
            .with_synonym("domestic", CustomerLocation::Regional)
            .with_synonym("rural", CustomerLocation::Remote)
            .with_synonym("remote area", CustomerLocation::Remote)
            .with_synonym("intl", CustomerLocation::International)
            .with_synonym("overseas", CustomerLocation::International)
            .with_synonym("abroad", CustomerLocation::International);

        let shipping_method = Lexicon::canonical()
            .with_synonym("express shipping", ShippingMethod::Express)
            .with_synonym("next day", ShippingMethod::Express)
            .with_synonym("priority", ShippingMethod::Express)
            .with_synonym("overnight", ShippingMethod::Express)
            .with_synonym("standard shipping", ShippingMethod::Standard)
            .with_synonym("regular", ShippingMethod::Standard)
            .with_synonym("ground", ShippingMethod::Standard)
            .with_synonym("economy shipping", ShippingMethod::Economy)
            .with_synonym("saver", ShippingMethod::Economy)
            .with_synonym("budget", ShippingMethod::Economy);

        Self {
            product_category,
            customer_location,
            shipping_method,
        }
    }

    /// Layer reference-data synonyms over this table.
    pub fn with_overrides(mut self, overrides: &SynonymOverrides) -> Self {
        for (synonym, value) in &overrides.product_category {
            self.product_category.insert(synonym, *value);
        }
        for (synonym, value) in &overrides.customer_location {
            self.customer_location.insert(synonym, *value);
        }
        for (synonym, value) in &overrides.shipping_method {
            self.shipping_method.insert(synonym, *value);
        }
        self
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Maps raw attribute strings onto [`OrderFeatures`].
///
/// Stateless apart from the shared, read-only synonym table, so a single
/// instance can serve any number of callers.
#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    synonyms: Arc<SynonymTable>,
}

impl FeatureNormalizer {
    pub fn new(synonyms: Arc<SynonymTable>) -> Self {
        Self { synonyms }
    }

    /// Normalize all three attributes. Fields are checked in the order
    /// category, location, shipping and the first failure is returned.
    pub fn normalize(
        &self,
        raw_product_category: &str,
        raw_customer_location: &str,
        raw_shipping_method: &str,
    ) -> Result<OrderFeatures, NormalizationError> {
        let product_category = self.synonyms.product_category.resolve(raw_product_category)?;
        let customer_location = self
            .synonyms
            .customer_location
            .resolve(raw_customer_location)?;
        let shipping_method = self.synonyms.shipping_method.resolve(raw_shipping_method)?;

        Ok(OrderFeatures::new(
            product_category,
            customer_location,
            shipping_method,
        ))
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(SynonymTable::builtin()))
    }
}

/// Normalize against the built-in vocabulary.
pub fn normalize(
    raw_product_category: &str,
    raw_customer_location: &str,
    raw_shipping_method: &str,
) -> Result<OrderFeatures, NormalizationError> {
    static BUILTIN: OnceLock<FeatureNormalizer> = OnceLock::new();
    BUILTIN.get_or_init(FeatureNormalizer::default).normalize(
        raw_product_category,
        raw_customer_location,
        raw_shipping_method,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Field;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_folds_case() {
        let features = normalize("electronics", "LOCAL", "express").unwrap();
        assert_eq!(
            features,
            OrderFeatures::new(
                ProductCategory::Electronics,
                CustomerLocation::Local,
                ShippingMethod::Express
            )
        );
    }

    #[test]
    fn test_normalize_trims_and_applies_synonyms() {
        let features = normalize("  Apparel ", "USA   local", "next-day").unwrap();
        assert_eq!(features.product_category, ProductCategory::Clothing);
        assert_eq!(features.customer_location, CustomerLocation::Local);
        assert_eq!(features.shipping_method, ShippingMethod::Express);
    }

    #[test]
    fn test_unknown_category_is_rejected_not_defaulted() {
        let err = normalize("teleportation", "Local", "Express").unwrap_err();
        assert_eq!(
            err,
            NormalizationError {
                field: Field::ProductCategory,
                raw_value: "teleportation".to_string(),
            }
        );
    }

    #[test]
    fn test_first_failing_field_is_reported() {
        let err = normalize("Clothing", "mars", "warp").unwrap_err();
        assert_eq!(err.field, Field::CustomerLocation);
        assert_eq!(err.raw_value, "mars");

        let err = normalize("Clothing", "Local", "warp").unwrap_err();
        assert_eq!(err.field, Field::ShippingMethod);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = normalize("   ", "Local", "Express").unwrap_err();
        assert_eq!(err.field, Field::ProductCategory);
        assert_eq!(err.raw_value, "   ");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for features in OrderFeatures::all_combinations() {
            let again = normalize(
                features.product_category.as_str(),
                features.customer_location.as_str(),
                features.shipping_method.as_str(),
            )
            .unwrap();
            assert_eq!(again, features);
        }
    }

    #[test]
    fn test_overrides_extend_vocabulary() {
        let mut overrides = SynonymOverrides::default();
        overrides
            .shipping_method
            .insert("Turbo".to_string(), ShippingMethod::Express);

        let normalizer =
            FeatureNormalizer::new(Arc::new(SynonymTable::builtin().with_overrides(&overrides)));
        let features = normalizer.normalize("Other", "Remote", "turbo").unwrap();
        assert_eq!(features.shipping_method, ShippingMethod::Express);

        // The built-in normalizer is unaffected.
        assert!(normalize("Other", "Remote", "turbo").is_err());
    }

    #[test]
    fn test_overrides_cannot_remap_canonical_names() {
        let mut overrides = SynonymOverrides::default();
        overrides
            .shipping_method
            .insert("Express".to_string(), ShippingMethod::Economy);
        overrides
            .shipping_method
            .insert(" ECONOMY ".to_string(), ShippingMethod::Economy);

        assert_eq!(
            overrides.canonical_conflicts(),
            vec![(Field::ShippingMethod, "Express".to_string())]
        );

        let normalizer =
            FeatureNormalizer::new(Arc::new(SynonymTable::builtin().with_overrides(&overrides)));
        let features = normalizer.normalize("Other", "Local", "Express").unwrap();
        assert_eq!(features.shipping_method, ShippingMethod::Express);
    }

    #[test]
    fn test_lexicon_insert_refuses_blank_and_canonical_keys() {
        let mut lexicon = Lexicon::<CustomerLocation>::canonical();
        assert!(!lexicon.insert("  ", CustomerLocation::Local));
        assert!(!lexicon.insert("remote", CustomerLocation::Local));
        assert!(lexicon.insert("Remote", CustomerLocation::Remote));
        assert!(lexicon.insert("downtown", CustomerLocation::Local));
        assert_eq!(lexicon.resolve("REMOTE").unwrap(), CustomerLocation::Remote);
        assert_eq!(lexicon.len(), 5);
    }

    #[test]
    fn test_canonical_lexicon_size() {
        assert_eq!(Lexicon::<ShippingMethod>::canonical().len(), 3);
    }
}
