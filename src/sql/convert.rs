//! Literal/expression text conversion per database family.

use super::dialect::{Dialect, SqlDialect};
use crate::model::{Item, ItemSource};

/// Produces the SQL text used for an item that is not a raw column.
///
/// Implementations let a "current time" expression render as
/// `CURRENT_TIMESTAMP`, `GETDATE()` or `SYSTIMESTAMP` depending on the
/// query's database family. Column items are handled by the generator and
/// normally never reach the converter; implementations return the column
/// name unchanged for them.
pub trait ConstantConverter: Send + Sync {
    fn convert(&self, dialect: Dialect, item: &Item) -> String;
}

/// Default converter: delegates to [`SqlDialect::convert_constant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DialectConverter;

impl ConstantConverter for DialectConverter {
    fn convert(&self, dialect: Dialect, item: &Item) -> String {
        match item.source() {
            ItemSource::Column(column) => column.name.clone(),
            ItemSource::Expression(expr) => dialect.convert_constant(&expr.text),
        }
    }
}
