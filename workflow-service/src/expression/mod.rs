// Expression Engine Module
// Expressions and scripts run in a boa_engine sandbox against node input and workflow variables

pub mod compare;
pub mod engine;
pub mod path;
pub mod sandbox;
pub mod script;
pub mod security;

pub use compare::{check_type, compare, is_truthy, loose_equals, strict_equals, CompareOp};
pub use engine::ExpressionEngine;
pub use path::{resolve_path, resolve_present};
pub use sandbox::{EvalError, ExpressionContext, Sandbox, SandboxLimits};
pub use script::Script;
