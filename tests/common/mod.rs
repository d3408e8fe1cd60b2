//! Shared fixtures for the integration tests.

use ember::ember_ast::{
    Ast, BlockId, BlockKind, DeclId, DiscriminationCase, DiscriminationId, EnumFlavor, ExprId,
    ExprKind, ParamSpec, Type,
};
use ember::ember_core::{Span, Symbol};

/// Route `tracing` output to the test harness; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// One module with helpers for the declarations the tests need.
pub struct Program<'db> {
    pub db: &'db dyn salsa::Database,
    pub ast: Ast<'db>,
    pub root: BlockId,
}

#[allow(dead_code)]
impl<'db> Program<'db> {
    pub fn new(db: &'db dyn salsa::Database) -> Self {
        let mut ast = Ast::new();
        let module = ast.add_module(Symbol::new("main"));
        let root = ast.module(module).root;
        Self { db, ast, root }
    }

    pub fn enumeration(&mut self, name: &'static str, members: &[&'static str]) -> DeclId {
        let members = members
            .iter()
            .map(|&member| (Symbol::new(member), None))
            .collect();
        let root = self.root;
        self.ast
            .declare_enum(self.db, root, Symbol::new(name), EnumFlavor::Plain, members)
    }

    pub fn type_of(&self, decl: DeclId) -> Type<'db> {
        self.ast.decl(decl).ty.expect("type declarations carry their type")
    }

    /// `name(x: $T)` with the given outputs.
    pub fn generic_function(&mut self, name: &'static str, outputs: Vec<ExprId>) -> DeclId {
        let shape = self.ast.alloc(ExprKind::PolymorphicType(Symbol::new("T")));
        let root = self.root;
        self.ast.declare_function(
            root,
            Symbol::new(name),
            vec![ParamSpec::new(Symbol::new("x"), shape)],
            outputs,
        )
    }

    /// An argument the typing pass has already given `ty`.
    pub fn argument(&mut self, ty: Type<'db>) -> ExprId {
        self.ast.alloc_typed(ExprKind::Name(Symbol::new("arg")), ty)
    }

    /// A comma list of member names, or a single name.
    pub fn labels(&mut self, names: &[&'static str]) -> ExprId {
        let leaves: Vec<ExprId> = names
            .iter()
            .map(|&name| self.ast.name(Symbol::new(name)))
            .collect();
        match leaves.as_slice() {
            [single] => *single,
            _ => self.ast.alloc(ExprKind::Comma(leaves)),
        }
    }

    pub fn discriminate(
        &mut self,
        subject_ty: Type<'db>,
        cases: &[&[&'static str]],
        default: bool,
    ) -> DiscriminationId {
        let root = self.root;
        let subject = self.argument(subject_ty);
        let cases = cases
            .iter()
            .map(|names| {
                let labels = self.labels(names);
                DiscriminationCase::new(labels, self.ast.add_block(root, BlockKind::Plain))
            })
            .collect();
        let default = default.then(|| self.ast.add_block(root, BlockKind::Plain));
        self.ast
            .add_discrimination(root, Span::new(0, 1), subject, cases, default)
    }
}
