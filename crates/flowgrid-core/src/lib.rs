pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod flow;
pub mod io;
pub mod openapi;
pub mod paths;
pub mod reorder;
pub mod rows;
pub mod scenario;
pub mod schema;
pub mod session;
pub mod store;
pub mod types;

pub use error::{FlowgridError, Result};
