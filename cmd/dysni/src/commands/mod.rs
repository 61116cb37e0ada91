//! CLI commands module.

mod evaluate;
mod resolve;
mod util;

pub use evaluate::EvaluateCommand;
pub use resolve::ResolveCommand;
#[cfg(test)]
pub use resolve::{ResolverKind, StoreKind};

pub(crate) use util::*;
