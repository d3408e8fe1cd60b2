//! Implicit conversions between types.

use ember_ast::{ConversionKind, Type, TypeKind};

/// The implicit conversion turning a `from` value into a `to` value, if
/// one exists.
pub fn find_conversion<'db>(
    db: &'db dyn salsa::Database,
    from: Type<'db>,
    to: Type<'db>,
) -> Option<ConversionKind> {
    if from == to {
        return Some(ConversionKind::Identity);
    }
    match (from.kind(db), to.kind(db)) {
        (TypeKind::IntLiteral, TypeKind::Int { .. } | TypeKind::Real { .. }) => {
            Some(ConversionKind::FromIntLiteral)
        }
        (
            TypeKind::Int {
                signed: from_signed,
                bits: from_bits,
            },
            TypeKind::Int {
                signed: to_signed,
                bits: to_bits,
            },
        ) => {
            let widens = if from_signed == to_signed {
                from_bits <= to_bits
            } else {
                // Unsigned values fit a strictly wider signed type.
                !from_signed && from_bits < to_bits
            };
            widens.then_some(ConversionKind::IntWidening)
        }
        (TypeKind::Real { bits: from_bits }, TypeKind::Real { bits: to_bits }) => {
            (from_bits <= to_bits).then_some(ConversionKind::RealWidening)
        }
        (TypeKind::Reference(pointee), _) if *pointee == to => Some(ConversionKind::Dereference),
        (_, TypeKind::Reference(pointee)) if *pointee == from => {
            Some(ConversionKind::TakeReference)
        }
        (
            TypeKind::FixedArray { element, .. } | TypeKind::DynamicArray(element),
            TypeKind::Slice(target),
        ) if element == target => Some(ConversionKind::ToSlice),
        _ => None,
    }
}
