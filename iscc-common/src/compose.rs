//! Composite identifier composition
//!
//! `compose` is pure and order sensitive: the composite embeds the complete
//! unit codes in content, data, instance order. Each embedded unit keeps its own
//! header, so swapping two distinct constituents always changes the result.

use crate::codec::{self, MainType};
use crate::units::UnitCode;

/// The three unit codes of one asset, in composition order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTriple {
    pub content: UnitCode,
    pub data: UnitCode,
    pub instance: UnitCode,
}

impl UnitTriple {
    pub fn iter(&self) -> impl Iterator<Item = &UnitCode> {
        [&self.content, &self.data, &self.instance].into_iter()
    }
}

/// Composite identifier together with the units it was composed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeIdentifier {
    value: String,
    constituents: UnitTriple,
}

impl CompositeIdentifier {
    /// Composite code string
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn constituents(&self) -> &UnitTriple {
        &self.constituents
    }
}

/// Compose three unit codes into one composite identifier
///
/// Callers pass the content, data and instance units in that order. Passing a
/// unit of the wrong kind is a caller bug; the result is still well formed and
/// decomposes back into the units as given.
pub fn compose(content: &UnitCode, data: &UnitCode, instance: &UnitCode) -> CompositeIdentifier {
    let header = codec::encode_header(MainType::Iscc, content.subtype(), codec::VERSION, 0);

    let mut raw = header.to_vec();
    raw.extend(content.raw());
    raw.extend(data.raw());
    raw.extend(instance.raw());

    CompositeIdentifier {
        value: codec::encode_code(&raw),
        constituents: UnitTriple {
            content: content.clone(),
            data: data.clone(),
            instance: instance.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decompose, SUBTYPE_IMAGE, SUBTYPE_NONE};
    use crate::units::UnitKind;

    fn units() -> (UnitCode, UnitCode, UnitCode) {
        (
            UnitCode::new(UnitKind::Content, SUBTYPE_IMAGE, vec![0xAA; 8]),
            UnitCode::new(UnitKind::Data, SUBTYPE_NONE, vec![0x55; 8]),
            UnitCode::new(UnitKind::Instance, SUBTYPE_NONE, vec![0x0F; 8]),
        )
    }

    #[test]
    fn test_compose_is_deterministic() {
        let (c, d, i) = units();
        assert_eq!(compose(&c, &d, &i).value(), compose(&c, &d, &i).value());
    }

    #[test]
    fn test_compose_is_order_sensitive() {
        let (c, d, i) = units();
        let reference = compose(&c, &d, &i);

        assert_ne!(reference.value(), compose(&d, &c, &i).value());
        assert_ne!(reference.value(), compose(&c, &i, &d).value());
        assert_ne!(reference.value(), compose(&i, &d, &c).value());
    }

    #[test]
    fn test_swapping_same_kind_units_changes_value() {
        // Two distinct data units sharing a 64-bit prefix
        let (c, _, i) = units();
        let a = UnitCode::new(UnitKind::Data, SUBTYPE_NONE, [vec![1; 8], vec![2; 8]].concat());
        let b = UnitCode::new(UnitKind::Data, SUBTYPE_NONE, [vec![1; 8], vec![3; 8]].concat());

        assert_ne!(compose(&c, &a, &i).value(), compose(&c, &b, &i).value());
        assert_ne!(compose(&a, &b, &i).value(), compose(&b, &a, &i).value());
    }

    #[test]
    fn test_composite_decomposes_into_constituents() {
        let (c, d, i) = units();
        let composite = compose(&c, &d, &i);

        assert!(composite.value().starts_with("ISCC:"));
        let parts = decompose(composite.value()).unwrap();
        assert_eq!(parts, vec![c, d, i]);
        assert_eq!(
            composite.constituents().iter().count(),
            3,
            "triple must always hold three units"
        );
    }
}
