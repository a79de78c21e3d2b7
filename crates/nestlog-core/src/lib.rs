pub mod category;
pub mod config;
mod error;
pub mod message;
pub mod quantity;
pub mod record;
pub mod report;
pub mod schema;

pub use category::{Category, CategoryMatch};
pub use config::NestlogConfig;
pub use error::ConfigError;
pub use message::{DateOrder, RawMessage};
pub use quantity::{ExtractedQuantity, QuantityKind, Unit};
pub use record::{ActivityDetail, ActivityRecord, Source};
pub use report::{BatchReport, Warning, WarningReason};
pub use schema::activity;
