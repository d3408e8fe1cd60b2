//! The node arena.

use ember_core::{Span, Symbol};

use crate::{
    Block, BlockId, BlockKind, Decl, DeclId, DeclKind, Discrimination, DiscriminationCase,
    DiscriminationId, Expr, ExprId, ExprKind, Module, ModuleId, Statement, Type,
};

/// All nodes of one compilation unit.
///
/// Nodes are never removed; passes refer to them through the id types in
/// [`crate::ids`].
#[derive(Clone, Debug, Default)]
pub struct Ast<'db> {
    exprs: Vec<Expr<'db>>,
    decls: Vec<Decl<'db>>,
    blocks: Vec<Block>,
    modules: Vec<Module>,
    discriminations: Vec<Discrimination>,
}

impl<'db> Ast<'db> {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Modules and blocks
    // ========================================================================

    /// Create a module together with its top-level block.
    pub fn add_module(&mut self, name: Symbol) -> ModuleId {
        let module = ModuleId::next(self.modules.len());
        let root = BlockId::next(self.blocks.len());
        self.blocks.push(Block {
            kind: BlockKind::Module,
            parent: None,
            module,
            statements: Vec::new(),
            symbols: Vec::new(),
        });
        self.modules.push(Module {
            name,
            root,
            imports: Vec::new(),
        });
        module
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn add_import(&mut self, module: ModuleId, imported: ModuleId) {
        let imports = &mut self.modules[module.index()].imports;
        if !imports.contains(&imported) {
            imports.push(imported);
        }
    }

    pub fn add_block(&mut self, parent: BlockId, kind: BlockKind) -> BlockId {
        let id = BlockId::next(self.blocks.len());
        let module = self.block(parent).module;
        self.blocks.push(Block {
            kind,
            parent: Some(parent),
            module,
            statements: Vec::new(),
            symbols: Vec::new(),
        });
        id
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index()]
    }

    pub fn push_statement(&mut self, block: BlockId, statement: Statement) {
        self.block_mut(block).statements.push(statement);
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Allocate a declaration without making it visible anywhere.
    pub fn alloc_decl(&mut self, decl: Decl<'db>) -> DeclId {
        let id = DeclId::next(self.decls.len());
        self.decls.push(decl);
        id
    }

    /// Allocate a declaration, append it to `block` and register its name.
    pub fn declare(
        &mut self,
        block: BlockId,
        name: Symbol,
        span: Span,
        kind: DeclKind<'db>,
        ty: Option<Type<'db>>,
    ) -> DeclId {
        let id = self.alloc_decl(Decl {
            name,
            span,
            kind,
            ty,
            parent: block,
            validated: false,
        });
        let block = self.block_mut(block);
        block.statements.push(Statement::Decl(id));
        block.symbols.push(id);
        id
    }

    /// Make `decl` the first statement of `block` and register it in the
    /// block's symbol table.
    pub fn insert_declaration_at_front(&mut self, block: BlockId, decl: DeclId) {
        self.decls[decl.index()].parent = block;
        let block = self.block_mut(block);
        block.statements.insert(0, Statement::Decl(decl));
        block.symbols.push(decl);
    }

    pub fn decl(&self, id: DeclId) -> &Decl<'db> {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl<'db> {
        &mut self.decls[id.index()]
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn alloc(&mut self, kind: ExprKind<'db>) -> ExprId {
        self.alloc_at(kind, Span::default())
    }

    pub fn alloc_at(&mut self, kind: ExprKind<'db>, span: Span) -> ExprId {
        let id = ExprId::next(self.exprs.len());
        self.exprs.push(Expr::new(kind, span));
        id
    }

    /// Allocate an expression whose type is already known.
    pub fn alloc_typed(&mut self, kind: ExprKind<'db>, ty: Type<'db>) -> ExprId {
        let id = self.alloc(kind);
        self.set_type(id, ty);
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr<'db> {
        &self.exprs[id.index()]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr<'db> {
        &mut self.exprs[id.index()]
    }

    pub fn set_type(&mut self, id: ExprId, ty: Type<'db>) {
        self.expr_mut(id).ty = Some(ty);
    }

    /// Direct sub-expressions of `id`, in source order.
    pub fn children(&self, id: ExprId) -> Vec<ExprId> {
        match &self.expr(id).kind {
            ExprKind::Literal(_)
            | ExprKind::Name(_)
            | ExprKind::TypeLiteral(_)
            | ExprKind::AnyType
            | ExprKind::PolymorphicType(_) => Vec::new(),
            ExprKind::ConstrainedType { constraint, .. } => vec![*constraint],
            ExprKind::PointerType(inner)
            | ExprKind::ReferenceType(inner)
            | ExprKind::SliceType(inner)
            | ExprKind::DynamicArrayType(inner)
            | ExprKind::VariadicType(inner)
            | ExprKind::Paren(inner)
            | ExprKind::SizeOf(inner)
            | ExprKind::TypeOf(inner) => vec![*inner],
            ExprKind::FixedArrayType { size, element } => vec![*size, *element],
            ExprKind::FunctionType { params, outputs } => {
                params.iter().chain(outputs).copied().collect()
            }
            ExprKind::Unary { operand, .. } => vec![*operand],
            ExprKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => std::iter::once(*condition)
                .chain(std::iter::once(*then_branch))
                .chain(*else_branch)
                .collect(),
            ExprKind::Cast { expr, target } => vec![*expr, *target],
            ExprKind::Member { base, .. } => vec![*base],
            ExprKind::Call { callee, args } => std::iter::once(*callee)
                .chain(args.iter().copied())
                .collect(),
            ExprKind::NamedArgument { value, .. } => vec![*value],
            ExprKind::Comma(items) | ExprKind::ArrayLiteral(items) => items.clone(),
            ExprKind::ExtractUnionPayload { union_expr, .. } => vec![*union_expr],
        }
    }

    /// Leaves of a comma list; a non-list expression is its own only leaf.
    pub fn flatten_comma(&self, id: ExprId) -> Vec<ExprId> {
        match &self.expr(id).kind {
            ExprKind::Comma(items) => items.iter().flat_map(|&e| self.flatten_comma(e)).collect(),
            _ => vec![id],
        }
    }

    // ========================================================================
    // Match instructions
    // ========================================================================

    pub fn add_discrimination(
        &mut self,
        block: BlockId,
        span: Span,
        discriminee: ExprId,
        cases: Vec<DiscriminationCase>,
        default: Option<BlockId>,
    ) -> DiscriminationId {
        let id = DiscriminationId::next(self.discriminations.len());
        self.discriminations.push(Discrimination {
            span,
            discriminee,
            cases,
            default,
            block,
            kind: None,
        });
        self.push_statement(block, Statement::Discrimination(id));
        id
    }

    pub fn discrimination(&self, id: DiscriminationId) -> &Discrimination {
        &self.discriminations[id.index()]
    }

    pub fn discrimination_mut(&mut self, id: DiscriminationId) -> &mut Discrimination {
        &mut self.discriminations[id.index()]
    }
}
