//! Centralized error handling for `probus`.
//!
//! Every domain error implements [`ErrorExt`], carries a [`StatusCode`] and
//! can be lifted into a [`StackError`] that accumulates context while it
//! travels up the call stack.

pub mod context;
pub mod ext;
pub mod stack;
pub mod status_code;
pub mod types;

// Publicly re-export all error types and functions from the submodules to
// simplify access from external code.
pub use context::*;
pub use ext::*;
pub use stack::*;
pub use status_code::*;
pub use types::*;

pub type ProbusResult<T> = Result<T, StackError>;
