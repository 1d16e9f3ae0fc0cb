pub mod catalog;
pub mod errors;
pub mod export;
pub mod ingest;
pub mod traits;

pub use catalog::Catalog;
pub use errors::*;
pub use export::FeatureExportWriter;
pub use traits::*;
