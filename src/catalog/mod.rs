//! Schema catalog: database directories and their table registries

mod database;
mod registry;

pub use database::{CreateOutcome, Database};
pub use registry::{CreatedTable, DropOutcome, TableRegistry};
