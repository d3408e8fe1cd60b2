//! Candidate discovery and the lock-step walk of parameter shapes against
//! argument types.

use ember_ast::{
    AggregateDecl, BlockId, DeclId, DeclKind, ExprId, ExprKind, FunctionDecl, Literal,
    TaggedValue, Type, TypeKind,
};
use ember_core::Symbol;
use tracing::trace;

use super::item::{Candidate, ItemKind, ItemTable, MonomorphizationItem};
use super::{Halt, MonoError, Monomorphizer, ShapeSite, Step};
use crate::Dependency;
use crate::eval::{ConstantEvaluator, denoted_type};
use crate::report::ErrorSite;

impl<'a, 'db> Monomorphizer<'a, 'db> {
    // ========================================================================
    // Discovery
    // ========================================================================

    /// Register every item the function's parameters introduce, in
    /// declaration order.
    pub(super) fn discover(&self, function: &FunctionDecl) -> Step<'db, ItemTable<'db>> {
        let mut table = ItemTable::default();
        for &param in &function.params {
            let decl = self.ast.decl(param);
            let DeclKind::Param { shape, value_param } = decl.kind else {
                continue;
            };
            if value_param {
                let (kind, constraint) = match self.ast.expr(shape).kind {
                    ExprKind::AnyType => (ItemKind::Type, None),
                    _ => (
                        ItemKind::Value,
                        denoted_type(self.db, self.ast, shape, function.scope),
                    ),
                };
                trace!("registered {} item `${}`", kind.describe(), decl.name);
                table.register(decl.name, kind, constraint);
            } else {
                self.collect_items(&mut table, shape, None, function.scope)?;
            }
        }
        Ok(table)
    }

    /// `value_type` is set when `shape` sits where a value is expected, such
    /// as the size of a fixed array.
    fn collect_items(
        &self,
        table: &mut ItemTable<'db>,
        shape: ExprId,
        value_type: Option<Type<'db>>,
        scope: BlockId,
    ) -> Step<'db> {
        match &self.ast.expr(shape).kind {
            ExprKind::PolymorphicType(name) => {
                let kind = if value_type.is_some() {
                    ItemKind::Value
                } else {
                    ItemKind::Type
                };
                trace!("registered {} item `${name}`", kind.describe());
                table.register(*name, kind, value_type);
            }
            ExprKind::ConstrainedType { var, constraint } => {
                trace!("registered constrained item `${var}`");
                table.register(
                    *var,
                    ItemKind::Type,
                    denoted_type(self.db, self.ast, *constraint, scope),
                );
            }
            ExprKind::FixedArrayType { size, element } => {
                self.collect_items(table, *size, Some(Type::i64(self.db)), scope)?;
                self.collect_items(table, *element, None, scope)?;
            }
            ExprKind::Call { callee, args } => {
                let aggregate = denoted_type(self.db, self.ast, *callee, scope)
                    .and_then(|ty| ty.decl(self.db))
                    .and_then(|decl| match &self.ast.decl(decl).kind {
                        DeclKind::Aggregate(aggregate) => Some(aggregate),
                        _ => None,
                    });
                match aggregate {
                    Some(aggregate) => {
                        for (ident, sub) in self.aggregate_arguments(aggregate, args)? {
                            let value_type = self.aggregate_param(aggregate, ident).and_then(
                                |(is_value, ty)| {
                                    is_value.then(|| ty.unwrap_or_else(|| Type::i64(self.db)))
                                },
                            );
                            self.collect_items(table, sub, value_type, scope)?;
                        }
                    }
                    None => {
                        for &arg in args {
                            self.collect_items(table, arg, None, scope)?;
                        }
                    }
                }
            }
            _ => {
                for child in self.ast.children(shape) {
                    self.collect_items(table, child, None, scope)?;
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Aggregate parameters
    // ========================================================================

    /// Items for the polymorphic parameters of an aggregate.
    pub(super) fn aggregate_table(&self, aggregate: &AggregateDecl<'db>) -> ItemTable<'db> {
        let mut table = ItemTable::default();
        for &param in &aggregate.params {
            let decl = self.ast.decl(param);
            if let DeclKind::Polymorphic(poly) = &decl.kind {
                let kind = if poly.is_value {
                    ItemKind::Value
                } else {
                    ItemKind::Type
                };
                table.register(decl.name, kind, poly.ty);
            }
        }
        table
    }

    /// `(is_value, declared type)` of the aggregate parameter `ident`.
    fn aggregate_param(
        &self,
        aggregate: &AggregateDecl<'db>,
        ident: Symbol,
    ) -> Option<(bool, Option<Type<'db>>)> {
        aggregate.params.iter().find_map(|&param| {
            let decl = self.ast.decl(param);
            match &decl.kind {
                DeclKind::Polymorphic(poly) if decl.name == ident => Some((poly.is_value, poly.ty)),
                _ => None,
            }
        })
    }

    /// Pair construction arguments with parameter names; `name = value`
    /// arguments may appear in any order.
    pub(super) fn aggregate_arguments(
        &self,
        aggregate: &AggregateDecl<'db>,
        args: &[ExprId],
    ) -> Step<'db, Vec<(Symbol, ExprId)>> {
        let names: Vec<Symbol> = aggregate
            .params
            .iter()
            .map(|&param| self.ast.decl(param).name)
            .collect();
        args.iter()
            .enumerate()
            .map(|(index, &arg)| match self.ast.expr(arg).kind {
                ExprKind::NamedArgument { name, value } => {
                    if names.contains(&name) {
                        Ok((name, value))
                    } else {
                        Err(MonoError::UnknownParameter {
                            span: self.ast.expr(arg).span,
                            ident: name,
                        }
                        .into())
                    }
                }
                _ => names.get(index).map(|&name| (name, arg)).ok_or_else(|| {
                    MonoError::TooManyArguments {
                        span: self.ast.expr(arg).span,
                        expected: names.len(),
                        found: args.len(),
                    }
                    .into()
                }),
            })
            .collect()
    }

    // ========================================================================
    // Unification
    // ========================================================================

    /// Match one call argument against parameter `param` and return how
    /// specific the match was, between 0 and 1.
    pub(super) fn unify_argument(
        &self,
        table: &mut ItemTable<'db>,
        param: DeclId,
        arg: ExprId,
        fn_scope: BlockId,
        call_scope: BlockId,
    ) -> Step<'db, f64> {
        let Some(received) = self.ast.expr(arg).ty else {
            return Err(Halt::Blocked(Dependency::Expr(arg)));
        };
        let decl = self.ast.decl(param);
        let DeclKind::Param { shape, value_param } = decl.kind else {
            return Err(self.unsupported(ErrorSite::Decl(param), "not a parameter"));
        };

        if value_param {
            let value = ConstantEvaluator::new(self.db, self.ast, &self.ctx.config)
                .evaluate(arg, call_scope)?;
            let candidate = Candidate {
                item: self.value_item(decl.name, value, Some(received)),
                depth: 1,
                site: arg,
            };
            self.add_candidate(table, decl.name, candidate)?;
            return Ok(1.0);
        }

        let site = ShapeSite {
            arg,
            scope: fn_scope,
        };
        let mut reached = 0;
        self.unify_shape(table, site, shape, received, 1, &mut reached)?;
        if reached == 0 {
            return Ok(1.0);
        }
        Ok((reached as f64 / received.depth(self.db) as f64).min(1.0))
    }

    fn unify_shape(
        &self,
        table: &mut ItemTable<'db>,
        site: ShapeSite,
        shape: ExprId,
        received: Type<'db>,
        depth: usize,
        reached: &mut usize,
    ) -> Step<'db> {
        let limit = self.ctx.config.max_shape_depth;
        if depth > limit {
            return Err(self.unsupported(
                ErrorSite::Expr(shape),
                format!("parameter shape nests deeper than {limit} levels"),
            ));
        }
        let db = self.db;
        let next = depth + 1;
        match (&self.ast.expr(shape).kind, received.kind(db)) {
            (ExprKind::Paren(inner), _) => {
                self.unify_shape(table, site, *inner, received, depth, reached)
            }
            (
                ExprKind::PolymorphicType(name) | ExprKind::ConstrainedType { var: name, .. },
                _,
            ) => self.bind(
                table,
                *name,
                MonomorphizationItem::of_type(*name, received),
                site,
                depth,
                reached,
            ),
            (ExprKind::Name(ident), _) => match self.polymorphic_name(site, *ident) {
                Some(name) => self.bind(
                    table,
                    name,
                    MonomorphizationItem::of_type(name, received),
                    site,
                    depth,
                    reached,
                ),
                None => Ok(()),
            },
            (ExprKind::AnyType | ExprKind::TypeLiteral(_), _) => Ok(()),
            (ExprKind::PointerType(inner), TypeKind::Pointer(pointee))
            | (ExprKind::ReferenceType(inner), TypeKind::Reference(pointee))
            | (ExprKind::DynamicArrayType(inner), TypeKind::DynamicArray(pointee))
            | (ExprKind::VariadicType(inner), TypeKind::Variadic(pointee))
            | (
                ExprKind::SliceType(inner),
                TypeKind::Slice(pointee)
                | TypeKind::DynamicArray(pointee)
                | TypeKind::FixedArray {
                    element: pointee, ..
                },
            ) => self.unify_shape(table, site, *inner, *pointee, next, reached),
            // A reference parameter binds the argument itself, as does each
            // argument absorbed by a variadic parameter.
            (ExprKind::ReferenceType(inner) | ExprKind::VariadicType(inner), _) => {
                self.unify_shape(table, site, *inner, received, next, reached)
            }
            (
                ExprKind::FixedArrayType { size, element },
                TypeKind::FixedArray {
                    element: received_element,
                    size: received_size,
                },
            ) => {
                self.unify_size(table, site, *size, *received_size, next, reached)?;
                self.unify_shape(table, site, *element, *received_element, next, reached)
            }
            (
                ExprKind::FunctionType { params, outputs },
                TypeKind::Function {
                    params: received_params,
                    output,
                },
            ) => {
                if params.len() != received_params.len() {
                    return Err(self.shape_mismatch(shape, received));
                }
                for (&param, &received_param) in params.iter().zip(received_params) {
                    self.unify_shape(table, site, param, received_param, next, reached)?;
                }
                match (outputs.as_slice(), output.kind(db)) {
                    ([], _) if output.is_void(db) => Ok(()),
                    ([single], _) => self.unify_shape(table, site, *single, *output, next, reached),
                    (many, TypeKind::Tuple(items)) if many.len() == items.len() => {
                        for (&output, &item) in many.iter().zip(items) {
                            self.unify_shape(table, site, output, item, next, reached)?;
                        }
                        Ok(())
                    }
                    _ => Err(self.shape_mismatch(shape, received)),
                }
            }
            (ExprKind::Call { callee, args }, _) => {
                self.unify_construction(table, site, shape, *callee, args, received, next, reached)
            }
            (
                ExprKind::PointerType(_)
                | ExprKind::SliceType(_)
                | ExprKind::DynamicArrayType(_)
                | ExprKind::FixedArrayType { .. }
                | ExprKind::FunctionType { .. },
                _,
            ) => Err(self.shape_mismatch(shape, received)),
            _ => Err(self.unsupported(
                ErrorSite::Expr(shape),
                "expression is not a parameter shape",
            )),
        }
    }

    /// The size of a fixed-array shape: binds `$N`, or must evaluate to the
    /// received size.
    fn unify_size(
        &self,
        table: &mut ItemTable<'db>,
        site: ShapeSite,
        size: ExprId,
        received: i64,
        depth: usize,
        reached: &mut usize,
    ) -> Step<'db> {
        let placeholder = match self.ast.expr(size).kind {
            ExprKind::PolymorphicType(name) => Some(name),
            ExprKind::Name(ident) => self.polymorphic_name(site, ident),
            _ => None,
        };
        if let Some(name) = placeholder {
            let item =
                MonomorphizationItem::of_value(name, Type::i64(self.db), TaggedValue::Int(received));
            return self.bind(table, name, item, site, depth, reached);
        }
        let expected = ConstantEvaluator::new(self.db, self.ast, &self.ctx.config)
            .evaluate(size, site.scope)?;
        if expected == TaggedValue::Int(received) {
            Ok(())
        } else {
            Err(MonoError::ShapeMismatch {
                span: self.ast.expr(size).span,
                expected: format!("[{}]", expected.display(self.db)),
                found: format!("[{received}]"),
            }
            .into())
        }
    }

    /// `Name(args)` in a shape: struct or union construction, or an opaque
    /// type wrapping its single argument.
    #[allow(clippy::too_many_arguments)]
    fn unify_construction(
        &self,
        table: &mut ItemTable<'db>,
        site: ShapeSite,
        shape: ExprId,
        callee: ExprId,
        args: &[ExprId],
        received: Type<'db>,
        depth: usize,
        reached: &mut usize,
    ) -> Step<'db> {
        let db = self.db;
        let Some(constructed) = denoted_type(db, self.ast, callee, site.scope) else {
            return Err(self.unsupported(
                ErrorSite::Expr(callee),
                "construction of an unknown type",
            ));
        };
        match (constructed.kind(db), received.kind(db)) {
            (
                TypeKind::Struct { decl, .. } | TypeKind::Union { decl, .. },
                TypeKind::Struct {
                    decl: received_decl,
                    args: values,
                    ..
                }
                | TypeKind::Union {
                    decl: received_decl,
                    args: values,
                    ..
                },
            ) if decl == received_decl && !values.is_empty() => {
                let DeclKind::Aggregate(aggregate) = &self.ast.decl(*decl).kind else {
                    return Err(self.unsupported(ErrorSite::Decl(*decl), "not an aggregate"));
                };
                for (ident, sub) in self.aggregate_arguments(aggregate, args)? {
                    let position = aggregate
                        .params
                        .iter()
                        .position(|&param| self.ast.decl(param).name == ident);
                    let Some(&value) = position.and_then(|index| values.get(index)) else {
                        return Err(self.shape_mismatch(shape, received));
                    };
                    self.unify_value(table, site, sub, value, depth, reached)?;
                }
                Ok(())
            }
            (TypeKind::Opaque { decl, .. }, TypeKind::Opaque {
                decl: received_decl,
                inner,
                ..
            }) if decl == received_decl => match args {
                [wrapped] => self.unify_shape(table, site, *wrapped, *inner, depth, reached),
                _ => Err(self.unsupported(
                    ErrorSite::Expr(shape),
                    "opaque construction takes exactly one argument",
                )),
            },
            _ => Err(self.shape_mismatch(shape, received)),
        }
    }

    /// One parameter value of a received aggregate instance against the
    /// sub-shape written at its position.
    fn unify_value(
        &self,
        table: &mut ItemTable<'db>,
        site: ShapeSite,
        shape: ExprId,
        value: TaggedValue<'db>,
        depth: usize,
        reached: &mut usize,
    ) -> Step<'db> {
        if let TaggedValue::Type(ty) = value {
            return self.unify_shape(table, site, shape, ty, depth, reached);
        }
        let placeholder = match self.ast.expr(shape).kind {
            ExprKind::PolymorphicType(name) => Some(name),
            ExprKind::Name(ident) => self.polymorphic_name(site, ident),
            _ => None,
        };
        if let Some(name) = placeholder {
            let item = self.value_item(name, value, None);
            return self.bind(table, name, item, site, depth, reached);
        }
        let expected = ConstantEvaluator::new(self.db, self.ast, &self.ctx.config)
            .evaluate(shape, site.scope)?;
        if expected == value {
            Ok(())
        } else {
            Err(MonoError::ShapeMismatch {
                span: self.ast.expr(shape).span,
                expected: expected.display(self.db),
                found: value.display(self.db),
            }
            .into())
        }
    }

    // ========================================================================
    // Candidates
    // ========================================================================

    fn bind(
        &self,
        table: &mut ItemTable<'db>,
        ident: Symbol,
        item: MonomorphizationItem<'db>,
        site: ShapeSite,
        depth: usize,
        reached: &mut usize,
    ) -> Step<'db> {
        *reached = (*reached).max(depth);
        let candidate = Candidate {
            item,
            depth,
            site: site.arg,
        };
        self.add_candidate(table, ident, candidate)
    }

    /// Record a candidate after checking it is the kind of thing the item
    /// stands for.
    pub(super) fn add_candidate(
        &self,
        table: &mut ItemTable<'db>,
        ident: Symbol,
        candidate: Candidate<'db>,
    ) -> Step<'db> {
        let Some(slot) = table.slot_mut(ident) else {
            return Ok(());
        };
        let found = if candidate.item.is_type {
            ItemKind::Type
        } else {
            ItemKind::Value
        };
        if found != slot.kind {
            let first = slot
                .candidates
                .first()
                .map_or(candidate.item, |first| first.item);
            return Err(MonoError::KindMismatch {
                span: self.ast.expr(candidate.site).span,
                ident,
                expected: slot.kind.describe().to_string(),
                found: found.describe().to_string(),
                first,
                second: candidate.item,
            }
            .into());
        }
        trace!(
            "candidate for `${ident}`: {} at depth {}",
            candidate.item.describe(self.db),
            candidate.depth
        );
        slot.candidates.push(candidate);
        Ok(())
    }

    /// Build an item out of an evaluated argument.
    pub(super) fn value_item(
        &self,
        ident: Symbol,
        value: TaggedValue<'db>,
        ty: Option<Type<'db>>,
    ) -> MonomorphizationItem<'db> {
        let db = self.db;
        match value {
            TaggedValue::Type(ty) => MonomorphizationItem::of_type(ident, ty),
            other => {
                let ty = ty.filter(|ty| !matches!(ty.kind(db), TypeKind::TypeOf(_)));
                let ty = ty.unwrap_or_else(|| match other {
                    TaggedValue::Int(_) => Type::int_literal(db),
                    TaggedValue::Real(_) => Type::f64(db),
                    TaggedValue::Bool(_) => Type::bool(db),
                    _ => Type::void(db),
                });
                MonomorphizationItem::of_value(ident, ty, other)
            }
        }
    }

    /// The item a plain name refers to, when it names one of the function's
    /// `$T`s or value parameters.
    pub(super) fn polymorphic_name(&self, site: ShapeSite, ident: Symbol) -> Option<Symbol> {
        let decl = self.ast.decl(self.ast.lookup(site.scope, ident)?);
        matches!(
            decl.kind,
            DeclKind::Polymorphic(_)
                | DeclKind::Param {
                    value_param: true,
                    ..
                }
        )
        .then_some(decl.name)
    }

    // ========================================================================
    // Errors
    // ========================================================================

    pub(super) fn unsupported(&self, site: ErrorSite, detail: impl Into<String>) -> Halt<'db> {
        let span = match site {
            ErrorSite::Expr(expr) => self.ast.expr(expr).span,
            ErrorSite::Decl(decl) => self.ast.decl(decl).span,
        };
        Halt::Failed(MonoError::UnsupportedShape {
            span,
            site,
            detail: detail.into(),
        })
    }

    fn shape_mismatch(&self, shape: ExprId, received: Type<'db>) -> Halt<'db> {
        Halt::Failed(MonoError::ShapeMismatch {
            span: self.ast.expr(shape).span,
            expected: self.shape_display(shape),
            found: received.display(self.db),
        })
    }

    /// Source-like rendering of a parameter shape.
    pub(super) fn shape_display(&self, shape: ExprId) -> String {
        let join = |items: &[ExprId]| {
            items
                .iter()
                .map(|&item| self.shape_display(item))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match &self.ast.expr(shape).kind {
            ExprKind::TypeLiteral(ty) => ty.display(self.db),
            ExprKind::Name(ident) => ident.to_string(),
            ExprKind::AnyType => "type".to_string(),
            ExprKind::PolymorphicType(name) => format!("${name}"),
            ExprKind::ConstrainedType { var, constraint } => {
                format!("${var}/{}", self.shape_display(*constraint))
            }
            ExprKind::PointerType(inner) => format!("*{}", self.shape_display(*inner)),
            ExprKind::ReferenceType(inner) => format!("&{}", self.shape_display(*inner)),
            ExprKind::SliceType(inner) => format!("[]{}", self.shape_display(*inner)),
            ExprKind::DynamicArrayType(inner) => format!("[..]{}", self.shape_display(*inner)),
            ExprKind::VariadicType(inner) => format!("...{}", self.shape_display(*inner)),
            ExprKind::FixedArrayType { size, element } => format!(
                "[{}]{}",
                self.shape_display(*size),
                self.shape_display(*element)
            ),
            ExprKind::FunctionType { params, outputs } => {
                format!("fn({}) -> ({})", join(params), join(outputs))
            }
            ExprKind::Call { callee, args } => {
                format!("{}({})", self.shape_display(*callee), join(args))
            }
            ExprKind::NamedArgument { name, value } => {
                format!("{name} = {}", self.shape_display(*value))
            }
            ExprKind::Paren(inner) => self.shape_display(*inner),
            ExprKind::Literal(Literal::Int(text)) => text.clone(),
            _ => format!("expression {shape}"),
        }
    }
}
