//! Table-scoped database operations.

mod clinical;
mod patient_files;
mod users;

pub use clinical::*;
pub use patient_files::*;
pub use users::*;
