pub mod errors;
pub mod features;
pub mod model;
pub mod query;
pub mod util;

pub use errors::*;
pub use features::*;
pub use model::*;
pub use query::*;
