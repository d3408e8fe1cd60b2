//! Choosing one binding per item and building the concrete type.

use std::sync::Arc;

use ember_ast::{BlockId, DeclId, DeclKind, ExprId, ExprKind, FunctionDecl, TaggedValue, Type, TypeKind};
use ember_core::{Span, Symbol};

use super::item::{Candidate, ItemKind, ItemTable, MonomorphizationItem, Slot};
use super::{
    Halt, Instantiation, MonoError, MonomorphizationSet, Monomorphizer, ShapeSite, Step,
};
use crate::Dependency;
use crate::conversion::find_conversion;
use crate::eval::{ConstantEvaluator, denoted_type};
use crate::report::ErrorSite;

impl<'a, 'db> Monomorphizer<'a, 'db> {
    /// One item per slot, in declaration order.
    pub(super) fn select(
        &self,
        table: &ItemTable<'db>,
        span: Span,
    ) -> Step<'db, MonomorphizationSet<'db>> {
        let mut set = MonomorphizationSet::new();
        for slot in table.slots() {
            let Some((first, rest)) = slot.candidates.split_first() else {
                return Err(MonoError::ItemMissing {
                    span,
                    ident: slot.ident,
                }
                .into());
            };
            let mut bound = *first;
            for &candidate in rest {
                bound = self.compatible(slot, bound, candidate)?;
            }
            self.check_constraint(slot, &bound)?;
            set.push(self.settle(slot, bound.item));
        }
        Ok(set)
    }

    /// Merge a later occurrence into the binding so far.
    ///
    /// An unsuffixed integer literal yields to any concrete numeric type;
    /// otherwise both must agree exactly. Among equal bindings the deeper
    /// one is kept.
    fn compatible(
        &self,
        slot: &Slot<'db>,
        bound: Candidate<'db>,
        other: Candidate<'db>,
    ) -> Step<'db, Candidate<'db>> {
        let db = self.db;
        let (first, second) = (bound.item, other.item);
        let is_literal = |ty: Type<'db>| matches!(ty.kind(db), TypeKind::IntLiteral);
        let is_number = |ty: Type<'db>| ty.is_integer(db) || ty.is_real(db);

        if first.is_type {
            if first.ty == second.ty {
                return Ok(if other.depth > bound.depth { other } else { bound });
            }
            if is_literal(first.ty) && is_number(second.ty) {
                return Ok(other);
            }
            if is_literal(second.ty) && is_number(first.ty) {
                return Ok(bound);
            }
            return Err(MonoError::TypeMismatch {
                span: self.ast.expr(other.site).span,
                ident: slot.ident,
                expected: first.ty.display(db),
                found: second.ty.display(db),
                first,
                second,
            }
            .into());
        }

        if first.value != second.value {
            return Err(MonoError::ValueMismatch {
                span: self.ast.expr(other.site).span,
                ident: slot.ident,
                expected: first.describe(db),
                found: second.describe(db),
                first,
                second,
            }
            .into());
        }
        Ok(if is_literal(first.ty) { other } else { bound })
    }

    /// `$T/C` accepts any instance of the aggregate `C` or anything that
    /// converts to `C`; a value item must convert to its declared type.
    fn check_constraint(&self, slot: &Slot<'db>, bound: &Candidate<'db>) -> Step<'db> {
        let Some(constraint) = slot.constraint else {
            return Ok(());
        };
        let db = self.db;
        let item = bound.item;
        if slot.kind == ItemKind::Type {
            if let Some(decl) = constraint.decl(db) {
                let target = self.ast.decl(decl);
                if matches!(target.kind, DeclKind::Aggregate(_)) && !target.validated {
                    return Err(Halt::Blocked(Dependency::Decl(decl)));
                }
                if item.ty.decl(db) == Some(decl) {
                    return Ok(());
                }
            }
        }
        if find_conversion(db, item.ty, constraint).is_some() {
            return Ok(());
        }
        Err(MonoError::TypeMismatch {
            span: self.ast.expr(bound.site).span,
            ident: slot.ident,
            expected: constraint.display(db),
            found: item.ty.display(db),
            first: item,
            second: MonomorphizationItem::of_type(slot.ident, constraint),
        }
        .into())
    }

    /// Replace literal types with the concrete defaults.
    fn settle(
        &self,
        slot: &Slot<'db>,
        item: MonomorphizationItem<'db>,
    ) -> MonomorphizationItem<'db> {
        let db = self.db;
        let is_literal = matches!(item.ty.kind(db), TypeKind::IntLiteral);
        match slot.kind {
            ItemKind::Type if is_literal => MonomorphizationItem::of_type(
                item.ident,
                slot.constraint
                    .filter(|ty| ty.is_integer(db) || ty.is_real(db))
                    .unwrap_or_else(|| Type::i32(db)),
            ),
            ItemKind::Type => item,
            ItemKind::Value => MonomorphizationItem {
                ty: slot.constraint.unwrap_or_else(|| {
                    if is_literal { Type::i64(db) } else { item.ty }
                }),
                ..item
            },
        }
    }

    // ========================================================================
    // Synthesis
    // ========================================================================

    /// The instantiated signature. Value parameters are known at compile
    /// time and disappear from it.
    pub(super) fn function_type(
        &self,
        function: &FunctionDecl,
        set: &MonomorphizationSet<'db>,
    ) -> Step<'db, Type<'db>> {
        let mut params = Vec::with_capacity(function.params.len());
        for &param in &function.params {
            if let DeclKind::Param {
                shape,
                value_param: false,
            } = self.ast.decl(param).kind
            {
                params.push(self.shape_type(shape, set, function.scope)?);
            }
        }
        let output = self.output_type(&function.outputs, set, function.scope)?;
        Ok(Type::function(self.db, params, output))
    }

    fn output_type(
        &self,
        outputs: &[ExprId],
        set: &MonomorphizationSet<'db>,
        scope: BlockId,
    ) -> Step<'db, Type<'db>> {
        match outputs {
            [] => Ok(Type::void(self.db)),
            [single] => self.shape_type(*single, set, scope),
            many => {
                let items = many
                    .iter()
                    .map(|&output| self.shape_type(output, set, scope))
                    .collect::<Step<'db, Vec<_>>>()?;
                Ok(Type::new(self.db, TypeKind::Tuple(items)))
            }
        }
    }

    /// Substitute the set into a parameter shape.
    pub(super) fn shape_type(
        &self,
        shape: ExprId,
        set: &MonomorphizationSet<'db>,
        scope: BlockId,
    ) -> Step<'db, Type<'db>> {
        let db = self.db;
        let wrap = |inner: ExprId, build: fn(Type<'db>) -> TypeKind<'db>| {
            self.shape_type(inner, set, scope)
                .map(|inner| Type::new(db, build(inner)))
        };
        match &self.ast.expr(shape).kind {
            ExprKind::Paren(inner) => self.shape_type(*inner, set, scope),
            ExprKind::PolymorphicType(name) | ExprKind::ConstrainedType { var: name, .. } => {
                self.bound_type(set, *name, shape)
            }
            ExprKind::Name(ident) => {
                let site = ShapeSite { arg: shape, scope };
                match self.polymorphic_name(site, *ident) {
                    Some(name) => self.bound_type(set, name, shape),
                    None => denoted_type(db, self.ast, shape, scope).ok_or_else(|| {
                        self.unsupported(ErrorSite::Expr(shape), format!("`{ident}` is not a type"))
                    }),
                }
            }
            ExprKind::TypeLiteral(ty) => Ok(*ty),
            ExprKind::PointerType(inner) => wrap(*inner, TypeKind::Pointer),
            ExprKind::ReferenceType(inner) => wrap(*inner, TypeKind::Reference),
            ExprKind::SliceType(inner) => wrap(*inner, TypeKind::Slice),
            ExprKind::DynamicArrayType(inner) => wrap(*inner, TypeKind::DynamicArray),
            ExprKind::VariadicType(inner) => wrap(*inner, TypeKind::Variadic),
            ExprKind::FixedArrayType { size, element } => {
                let size = self.shape_value(*size, set, scope)?;
                let Some(size) = size.as_int() else {
                    return Err(self.unsupported(
                        ErrorSite::Expr(shape),
                        "array size is not an integer",
                    ));
                };
                let element = self.shape_type(*element, set, scope)?;
                Ok(Type::fixed_array(db, element, size))
            }
            ExprKind::FunctionType { params, outputs } => {
                let params = params
                    .iter()
                    .map(|&param| self.shape_type(param, set, scope))
                    .collect::<Step<'db, Vec<_>>>()?;
                let output = self.output_type(outputs, set, scope)?;
                Ok(Type::function(db, params, output))
            }
            ExprKind::Call { callee, args } => self.construction_type(shape, *callee, args, set, scope),
            _ => Err(self.unsupported(
                ErrorSite::Expr(shape),
                "expression is not a parameter shape",
            )),
        }
    }

    fn bound_type(
        &self,
        set: &MonomorphizationSet<'db>,
        name: Symbol,
        shape: ExprId,
    ) -> Step<'db, Type<'db>> {
        match set.iter().find(|item| item.ident == name) {
            Some(item) if item.is_type => Ok(item.ty),
            Some(item) => Err(MonoError::KindMismatch {
                span: self.ast.expr(shape).span,
                ident: name,
                expected: "a type".to_string(),
                found: "a value".to_string(),
                first: *item,
                second: *item,
            }
            .into()),
            None => Err(MonoError::ItemMissing {
                span: self.ast.expr(shape).span,
                ident: name,
            }
            .into()),
        }
    }

    /// A value position in a shape: a bound `$N`, or a constant expression.
    fn shape_value(
        &self,
        shape: ExprId,
        set: &MonomorphizationSet<'db>,
        scope: BlockId,
    ) -> Step<'db, TaggedValue<'db>> {
        let placeholder = match self.ast.expr(shape).kind {
            ExprKind::PolymorphicType(name) => Some(name),
            ExprKind::Name(ident) => self.polymorphic_name(ShapeSite { arg: shape, scope }, ident),
            _ => None,
        };
        match placeholder {
            Some(name) => set
                .iter()
                .find(|item| item.ident == name)
                .map(MonomorphizationItem::as_value)
                .ok_or_else(|| {
                    MonoError::ItemMissing {
                        span: self.ast.expr(shape).span,
                        ident: name,
                    }
                    .into()
                }),
            None => Ok(ConstantEvaluator::new(self.db, self.ast, &self.ctx.config)
                .evaluate(shape, scope)?),
        }
    }

    /// `Name(args)` in a shape becomes the matching aggregate instance, or
    /// the opaque type itself.
    fn construction_type(
        &self,
        shape: ExprId,
        callee: ExprId,
        args: &[ExprId],
        set: &MonomorphizationSet<'db>,
        scope: BlockId,
    ) -> Step<'db, Type<'db>> {
        let db = self.db;
        let Some(constructed) = denoted_type(db, self.ast, callee, scope) else {
            return Err(self.unsupported(
                ErrorSite::Expr(callee),
                "construction of an unknown type",
            ));
        };
        let decl = match constructed.kind(db) {
            TypeKind::Opaque { .. } => return Ok(constructed),
            TypeKind::Struct { decl, .. } | TypeKind::Union { decl, .. } => *decl,
            _ => {
                return Err(self.unsupported(
                    ErrorSite::Expr(shape),
                    "only aggregates and opaque types can be constructed",
                ));
            }
        };
        let DeclKind::Aggregate(aggregate) = &self.ast.decl(decl).kind else {
            return Err(self.unsupported(ErrorSite::Decl(decl), "not an aggregate"));
        };

        let mut table = self.aggregate_table(aggregate);
        for (ident, sub) in self.aggregate_arguments(aggregate, args)? {
            let is_value = table
                .slot(ident)
                .is_some_and(|slot| slot.kind == ItemKind::Value);
            let value = if is_value {
                self.shape_value(sub, set, scope)?
            } else {
                TaggedValue::Type(self.shape_type(sub, set, scope)?)
            };
            let candidate = Candidate {
                item: self.value_item(ident, value, None),
                depth: 1,
                site: sub,
            };
            self.add_candidate(&mut table, ident, candidate)?;
        }
        let instance_set = self.select(&table, self.ast.expr(shape).span)?;
        Ok(self.instantiate_aggregate(decl, instance_set)?.ty)
    }

    /// Look up or create the aggregate instance for `set`.
    pub(super) fn instantiate_aggregate(
        &self,
        decl: DeclId,
        set: MonomorphizationSet<'db>,
    ) -> Step<'db, Arc<Instantiation<'db>>> {
        let db = self.db;
        let target = self.ast.decl(decl);
        let DeclKind::Aggregate(aggregate) = &target.kind else {
            return Err(self.unsupported(ErrorSite::Decl(decl), "not an aggregate"));
        };
        if let Some(instance) = self.ctx.monomorphizations.lookup(decl, &set) {
            return Ok(instance);
        }
        let ty = if set.is_empty() {
            match target.ty {
                Some(ty) => ty,
                None => return Err(Halt::Blocked(Dependency::Decl(decl))),
            }
        } else {
            let args = set.iter().map(MonomorphizationItem::as_value).collect();
            let kind = if aggregate.is_union {
                TypeKind::Union {
                    decl,
                    name: target.name,
                    args,
                }
            } else {
                TypeKind::Struct {
                    decl,
                    name: target.name,
                    args,
                }
            };
            Type::new(db, kind)
        };
        Ok(self.ctx.monomorphizations.instantiate(decl, set, ty))
    }
}
