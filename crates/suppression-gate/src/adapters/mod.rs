//! # Adapters
//!
//! - `json_source`: suppression list and banner files
//! - `api_handler`: JSON method dispatcher for a gateway or the runtime

pub mod api_handler;
pub mod json_source;

pub use api_handler::{handle_api_query, ApiGatewayHandler, ApiQueryError};
pub use json_source::{JsonFileBannerSource, JsonFileListSource};
