pub mod expr;
pub mod program;
pub mod span;
