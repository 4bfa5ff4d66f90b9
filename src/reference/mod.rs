pub mod cache;
pub mod catalog;
pub mod error;
pub mod queries;
pub mod source;
pub mod types;

pub use cache::ServiceIndexCache;
pub use catalog::ReferenceCatalog;
pub use error::{ReferenceError, ReferenceErrorKind};
pub use source::{HttpReferenceSource, ReferenceSource};
pub use types::{ServiceDocument, ServiceEntry, ServiceIndex};
