pub mod columns;
pub mod derive;
pub mod form;
pub mod group;
pub mod render;
pub mod session;
pub mod table;

pub use crate::domain::model::{ColumnDefinition, FieldValue, Record};
pub use crate::domain::ports::{Prompter, Storage, Submitter};
pub use crate::utils::error::Result;
