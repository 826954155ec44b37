pub mod batch;
pub mod etl;
pub mod keywords;
pub mod normalize;
pub mod pipeline;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::MetricsRecord;
pub use crate::domain::ports::{MetricsProvider, Pipeline, SpreadsheetStore, Storage};
pub use crate::utils::error::Result;
