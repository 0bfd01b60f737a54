pub mod batch;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod report;
pub mod table;

pub use config::MergeConfig;
pub use error::MergeError;
pub use merge::*;
pub use table::*;
