// Code Security Checks
// AST walk that rejects dynamic code execution and prototype tampering before a script runs

use std::ops::ControlFlow;

use boa_engine::ast::expression::access::{PropertyAccess, PropertyAccessField};
use boa_engine::ast::expression::{Call, Expression, Identifier, ImportCall, New};
use boa_engine::ast::scope::Scope;
use boa_engine::ast::visitor::{VisitWith, Visitor};
use boa_engine::interner::Interner;
use boa_engine::parser::{Parser, Source};

use crate::expression::sandbox::EvalError;

/// Globals a workflow script may not name
const FORBIDDEN_GLOBALS: &[&str] = &["require", "globalThis", "import"];

/// Properties that reach an object's prototype chain
const PROTOTYPE_FIELDS: &[&str] = &["__proto__", "constructor", "prototype"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    DynamicExecution,
    PrototypeTampering,
    ForbiddenGlobal,
}

#[derive(Debug, Clone)]
pub struct CodeViolation {
    pub kind: ViolationKind,
    pub description: String,
}

/// Parse `source` as a script and collect every rule it breaks.
///
/// Syntax errors surface as `EvalError` with a "parse error" prefix.
pub fn analyze(source: &str) -> Result<Vec<CodeViolation>, EvalError> {
    let mut interner = Interner::default();
    let mut parser = Parser::new(Source::from_bytes(source));
    let script = parser
        .parse_script(&Scope::new_global(), &mut interner)
        .map_err(|e| EvalError::new(format!("parse error: {}", e)))?;

    let mut visitor = SecurityVisitor::new(&interner);
    let _ = visitor.visit_script(&script);
    Ok(visitor.violations)
}

/// Like [`analyze`], but turns violations into an error
pub fn check(source: &str) -> Result<(), EvalError> {
    let violations = analyze(source)?;
    if violations.is_empty() {
        return Ok(());
    }

    let summary = violations
        .iter()
        .map(|v| v.description.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(EvalError::new(format!("forbidden code: {}", summary)))
}

struct SecurityVisitor<'a> {
    interner: &'a Interner,
    violations: Vec<CodeViolation>,
}

impl<'a> SecurityVisitor<'a> {
    fn new(interner: &'a Interner) -> Self {
        Self {
            interner,
            violations: Vec::new(),
        }
    }

    fn push(&mut self, kind: ViolationKind, description: impl Into<String>) {
        self.violations.push(CodeViolation {
            kind,
            description: description.into(),
        });
    }

    fn name_of(&self, ident: Identifier) -> Option<String> {
        self.interner
            .resolve(ident.sym())
            .and_then(|s| s.utf8().map(str::to_string))
    }

    fn is_named(&self, expr: &Expression, names: &[&str]) -> bool {
        match expr {
            Expression::Identifier(id) => self
                .name_of(*id)
                .map(|name| names.contains(&name.as_str()))
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl<'ast> Visitor<'ast> for SecurityVisitor<'_> {
    type BreakTy = ();

    fn visit_identifier(&mut self, node: &'ast Identifier) -> ControlFlow<Self::BreakTy> {
        if let Some(name) = self.name_of(*node) {
            if FORBIDDEN_GLOBALS.contains(&name.as_str()) {
                self.push(ViolationKind::ForbiddenGlobal, name);
            }
        }
        ControlFlow::Continue(())
    }

    fn visit_call(&mut self, node: &'ast Call) -> ControlFlow<Self::BreakTy> {
        if self.is_named(node.function(), &["eval", "Function"]) {
            self.push(ViolationKind::DynamicExecution, "dynamic code call");
        }
        node.visit_with(self)
    }

    fn visit_new(&mut self, node: &'ast New) -> ControlFlow<Self::BreakTy> {
        if self.is_named(node.constructor(), &["Function"]) {
            self.push(ViolationKind::DynamicExecution, "Function constructor");
        }
        node.visit_with(self)
    }

    fn visit_property_access(&mut self, node: &'ast PropertyAccess) -> ControlFlow<Self::BreakTy> {
        if let PropertyAccess::Simple(simple) = node {
            if let PropertyAccessField::Const(sym) = simple.field() {
                let field = self
                    .interner
                    .resolve(*sym)
                    .and_then(|s| s.utf8().map(str::to_string));
                if let Some(field) = field {
                    if PROTOTYPE_FIELDS.contains(&field.as_str()) {
                        self.push(ViolationKind::PrototypeTampering, field);
                    }
                }
            }
        }
        node.visit_with(self)
    }

    fn visit_import_call(&mut self, _node: &'ast ImportCall) -> ControlFlow<Self::BreakTy> {
        self.push(ViolationKind::ForbiddenGlobal, "import()");
        ControlFlow::Continue(())
    }
}
