//! # Domain Layer
//!
//! Pure domain logic for the suppression gate.
//!
//! - `entities`: lists, banners, check results, ad decisions
//! - `store`: authoritative list storage
//! - `index`: identifier -> advertiser set
//! - `catalog` / `selector`: banners and weighted selection
//! - `value_objects`: configuration
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - No synchronization; the service layer owns the locks

pub mod catalog;
pub mod entities;
pub mod errors;
pub mod index;
pub mod selector;
pub mod store;
pub mod value_objects;

pub use catalog::AdCatalog;
pub use entities::*;
pub use errors::*;
pub use index::{RetractOutcome, SuppressionIndex};
pub use selector::{select_weighted, AdSelector};
pub use store::SuppressionStore;
pub use value_objects::*;
