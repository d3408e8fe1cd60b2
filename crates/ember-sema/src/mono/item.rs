//! Monomorphization items and the working table the unifier fills in.

use ember_ast::{ExprId, TaggedValue, Type};
use ember_core::Symbol;
use smallvec::SmallVec;

/// One resolved `$Name` of a polymorphic declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MonomorphizationItem<'db> {
    pub ident: Symbol,
    /// The bound type for a type item; the value's own type otherwise.
    pub ty: Type<'db>,
    pub value: Option<TaggedValue<'db>>,
    pub is_type: bool,
}

impl<'db> MonomorphizationItem<'db> {
    pub fn of_type(ident: Symbol, ty: Type<'db>) -> Self {
        Self {
            ident,
            ty,
            value: None,
            is_type: true,
        }
    }

    pub fn of_value(ident: Symbol, ty: Type<'db>, value: TaggedValue<'db>) -> Self {
        Self {
            ident,
            ty,
            value: Some(value),
            is_type: false,
        }
    }

    /// The item as an aggregate argument.
    pub fn as_value(&self) -> TaggedValue<'db> {
        if self.is_type {
            TaggedValue::Type(self.ty)
        } else {
            self.value.unwrap_or(TaggedValue::None)
        }
    }

    pub fn describe(&self, db: &'db dyn salsa::Database) -> String {
        if self.is_type {
            self.ty.display(db)
        } else {
            self.as_value().display(db)
        }
    }
}

/// Items in declaration-parameter order. Equality is pointwise, which is
/// what the instantiation cache keys on.
pub type MonomorphizationSet<'db> = SmallVec<[MonomorphizationItem<'db>; 6]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ItemKind {
    Type,
    Value,
}

impl ItemKind {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            ItemKind::Type => "a type",
            ItemKind::Value => "a value",
        }
    }
}

/// One occurrence of a `$Name` matched against an argument.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate<'db> {
    pub item: MonomorphizationItem<'db>,
    /// Nesting level of the shape at which the binding was found.
    pub depth: usize,
    pub site: ExprId,
}

/// A `$Name` introduced by the declaration, with everything matched to it.
#[derive(Clone, Debug)]
pub(crate) struct Slot<'db> {
    pub ident: Symbol,
    pub kind: ItemKind,
    /// `$T/C` constraint for type items, declared type for value items.
    pub constraint: Option<Type<'db>>,
    pub candidates: Vec<Candidate<'db>>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ItemTable<'db> {
    slots: Vec<Slot<'db>>,
}

impl<'db> ItemTable<'db> {
    /// Register `ident` once; a later registration may only add a missing
    /// constraint.
    pub(crate) fn register(&mut self, ident: Symbol, kind: ItemKind, constraint: Option<Type<'db>>) {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.ident == ident) {
            if slot.constraint.is_none() {
                slot.constraint = constraint;
            }
            return;
        }
        self.slots.push(Slot {
            ident,
            kind,
            constraint,
            candidates: Vec::new(),
        });
    }

    pub(crate) fn slot(&self, ident: Symbol) -> Option<&Slot<'db>> {
        self.slots.iter().find(|slot| slot.ident == ident)
    }

    pub(crate) fn slot_mut(&mut self, ident: Symbol) -> Option<&mut Slot<'db>> {
        self.slots.iter_mut().find(|slot| slot.ident == ident)
    }

    pub(crate) fn slots(&self) -> &[Slot<'db>] {
        &self.slots
    }
}
