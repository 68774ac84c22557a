pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod format;
pub mod models;
pub mod query;
pub mod simplefin;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
