// irnames — identifier repository for dialect-based stack IR compilers
//
// Library root. The repository interns identifiers, tracks builtin metadata
// per dialect, mints derived names during optimization and assigns their
// final labels before emission.

pub mod dialect;
pub mod id;
pub mod labels;
pub mod predefined;
pub mod repository;
pub mod script;
pub mod table_dialect;

pub use dialect::{BuiltinFunction, Dialect, TargetInfo};
pub use id::{Entry, LabelId, Name};
pub use predefined::PredefinedNames;
pub use repository::{BuiltinHandle, NameRepository};
pub use table_dialect::{DialectError, TableDialect};
