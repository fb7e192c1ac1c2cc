//! SQL text concerns shared by query generation.
//!
//! - [`dialect`] - database families: identifier quoting, constant and
//!   function spellings
//! - [`convert`] - the [`ConstantConverter`] seam used for expression items

pub mod convert;
pub mod dialect;

pub use convert::{ConstantConverter, DialectConverter};
pub use dialect::{Dialect, SqlDialect};
