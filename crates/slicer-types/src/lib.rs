pub mod breakdown;
pub mod error;
pub mod export;
pub mod query;
pub mod record;
pub mod series;
pub mod sort;
pub mod table;
pub mod visible;

pub use breakdown::*;
pub use error::{Issue, Result};
pub use export::*;
pub use query::*;
pub use record::*;
pub use series::*;
pub use sort::*;
pub use table::*;
pub use visible::*;
