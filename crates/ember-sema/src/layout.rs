//! Sizes and alignments of concrete types.

use ember_ast::{Ast, DeclId, DeclKind, Type, TypeKind};

use crate::members::aggregate_members;

const POINTER_SIZE: u64 = 8;
const TAG_SIZE: u64 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub size: u64,
    pub align: u64,
}

impl Layout {
    const fn new(size: u64, align: u64) -> Self {
        Self { size, align }
    }

    const fn scalar(size: u64) -> Self {
        Self::new(size, size)
    }
}

/// Size in bytes of `ty`, or `None` if the type has no fixed size
/// (it is still polymorphic, or contains itself by value).
pub fn size_of<'db>(db: &'db dyn salsa::Database, ast: &Ast<'db>, ty: Type<'db>) -> Option<u64> {
    layout_of(db, ast, ty).map(|layout| layout.size)
}

pub fn layout_of<'db>(
    db: &'db dyn salsa::Database,
    ast: &Ast<'db>,
    ty: Type<'db>,
) -> Option<Layout> {
    LayoutComputer {
        db,
        ast,
        in_progress: Vec::new(),
    }
    .layout(ty)
}

struct LayoutComputer<'a, 'db> {
    db: &'db dyn salsa::Database,
    ast: &'a Ast<'db>,
    /// Aggregates whose layout is being computed.
    in_progress: Vec<DeclId>,
}

impl<'a, 'db> LayoutComputer<'a, 'db> {
    fn layout(&mut self, ty: Type<'db>) -> Option<Layout> {
        let db = self.db;
        let layout = match ty.kind(db) {
            TypeKind::Void => Layout::new(0, 1),
            TypeKind::Bool => Layout::scalar(1),
            TypeKind::Int { bits, .. } | TypeKind::Real { bits } => {
                Layout::scalar(u64::from(*bits).div_ceil(8).max(1))
            }
            TypeKind::IntLiteral => Layout::scalar(4),
            TypeKind::Pointer(_)
            | TypeKind::Reference(_)
            | TypeKind::Function { .. }
            | TypeKind::TypeOf(_) => Layout::scalar(POINTER_SIZE),
            TypeKind::FixedArray { element, size } => {
                let element = self.layout(*element)?;
                let count = u64::try_from(*size).ok()?;
                Layout::new(element.size.checked_mul(count)?, element.align)
            }
            // data pointer, length, capacity
            TypeKind::DynamicArray(_) => Layout::new(3 * POINTER_SIZE, POINTER_SIZE),
            // data pointer, length
            TypeKind::Slice(_) | TypeKind::Variadic(_) => Layout::new(2 * POINTER_SIZE, POINTER_SIZE),
            TypeKind::Tuple(items) => {
                let fields = items
                    .iter()
                    .map(|&item| self.layout(item))
                    .collect::<Option<Vec<_>>>()?;
                sequential(&fields)
            }
            TypeKind::Struct { decl, .. } | TypeKind::Union { decl, .. } => {
                if self.in_progress.contains(decl) {
                    return None;
                }
                self.in_progress.push(*decl);
                let layout = self.aggregate(ty, *decl);
                self.in_progress.pop();
                layout?
            }
            TypeKind::AnonymousUnion(members) => {
                let payloads = members
                    .iter()
                    .map(|&member| self.layout(member))
                    .collect::<Option<Vec<_>>>()?;
                tagged(&payloads)
            }
            TypeKind::Enum { .. } | TypeKind::Error { .. } => Layout::scalar(4),
            TypeKind::Opaque { inner, .. } => self.layout(*inner)?,
            TypeKind::Polymorphic(_) => return None,
        };
        Some(layout)
    }

    fn aggregate(&mut self, ty: Type<'db>, decl: DeclId) -> Option<Layout> {
        let ast = self.ast;
        let DeclKind::Aggregate(aggregate) = &ast.decl(decl).kind else {
            return None;
        };
        let (is_union, is_unsafe) = (aggregate.is_union, aggregate.is_unsafe);
        let members = aggregate_members(self.db, ast, ty)?;
        let fields = members
            .iter()
            .filter(|member| !member.constant)
            .map(|member| self.layout(member.ty))
            .collect::<Option<Vec<_>>>()?;
        Some(match (is_union, is_unsafe) {
            (false, _) => sequential(&fields),
            (true, true) => overlapping(&fields),
            (true, false) => tagged(&fields),
        })
    }
}

fn align_to(offset: u64, align: u64) -> u64 {
    offset.div_ceil(align) * align
}

/// Fields laid out one after another with natural alignment.
fn sequential(fields: &[Layout]) -> Layout {
    let mut offset = 0;
    let mut align = 1;
    for field in fields {
        offset = align_to(offset, field.align) + field.size;
        align = align.max(field.align);
    }
    Layout::new(align_to(offset, align), align)
}

/// All fields at offset zero.
fn overlapping(fields: &[Layout]) -> Layout {
    let size = fields.iter().map(|f| f.size).max().unwrap_or(0);
    let align = fields.iter().map(|f| f.align).max().unwrap_or(1);
    Layout::new(align_to(size, align), align)
}

/// The largest payload followed by a 32-bit tag.
fn tagged(payloads: &[Layout]) -> Layout {
    let payload = overlapping(payloads);
    sequential(&[payload, Layout::scalar(TAG_SIZE)])
}

#[cfg(test)]
mod tests {
    use ember_ast::{AggregateMember, AggregateSpec};
    use ember_core::{Span, Symbol};

    use super::*;

    fn member<'db>(name: &'static str, ty: Type<'db>) -> AggregateMember<'db> {
        AggregateMember {
            name: Symbol::new(name),
            span: Span::default(),
            ty,
            implicit: false,
            constant: false,
        }
    }

    #[test]
    fn test_scalar_and_array_sizes() {
        let db = salsa::DatabaseImpl::new();
        let ast = Ast::new();
        assert_eq!(size_of(&db, &ast, Type::bool(&db)), Some(1));
        assert_eq!(size_of(&db, &ast, Type::i64(&db)), Some(8));
        assert_eq!(
            size_of(&db, &ast, Type::fixed_array(&db, Type::i32(&db), 5)),
            Some(20)
        );
        assert_eq!(
            size_of(&db, &ast, Type::dynamic_array(&db, Type::bool(&db))),
            Some(24)
        );
        assert_eq!(
            size_of(&db, &ast, Type::polymorphic(&db, Symbol::new("T"))),
            None
        );
    }

    #[test]
    fn test_struct_padding_and_tagged_union() {
        let db = salsa::DatabaseImpl::new();
        let mut ast = Ast::new();
        let module = ast.add_module(Symbol::new("main"));
        let root = ast.module(module).root;

        let pair = ast.declare_aggregate(
            &db,
            root,
            Symbol::new("Pair"),
            AggregateSpec {
                members: vec![member("flag", Type::bool(&db)), member("value", Type::i64(&db))],
                ..Default::default()
            },
        );
        let pair_ty = ast.decl(pair).ty.unwrap();
        assert_eq!(
            layout_of(&db, &ast, pair_ty),
            Some(Layout { size: 16, align: 8 })
        );

        let shape = ast.declare_aggregate(
            &db,
            root,
            Symbol::new("Shape"),
            AggregateSpec {
                is_union: true,
                members: vec![member("circle", Type::f64(&db)), member("dot", Type::bool(&db))],
                ..Default::default()
            },
        );
        let shape_ty = ast.decl(shape).ty.unwrap();
        // 8 bytes of payload, then the 4-byte tag, rounded to 8.
        assert_eq!(size_of(&db, &ast, shape_ty), Some(16));
    }

    #[test]
    fn test_self_containing_struct_has_no_size() {
        let db = salsa::DatabaseImpl::new();
        let mut ast = Ast::new();
        let module = ast.add_module(Symbol::new("main"));
        let root = ast.module(module).root;
        let node = ast.declare_aggregate(&db, root, Symbol::new("Node"), AggregateSpec::default());
        let node_ty = ast.decl(node).ty.unwrap();
        if let DeclKind::Aggregate(aggregate) = &mut ast.decl_mut(node).kind {
            aggregate.members.push(member("next", node_ty));
        }
        assert_eq!(size_of(&db, &ast, node_ty), None);

        if let DeclKind::Aggregate(aggregate) = &mut ast.decl_mut(node).kind {
            aggregate.members[0].ty = Type::pointer(&db, node_ty);
        }
        assert_eq!(size_of(&db, &ast, node_ty), Some(8));
    }
}
