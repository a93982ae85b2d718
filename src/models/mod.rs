// Model exports
pub mod documents;
pub mod domain;
pub mod requests;
pub mod responses;

pub use documents::{DocumentError, RawCategory, RawProviderDocument, RawSiteSettings};
pub use domain::{AnnotatedRecord, CategoryRef, Coordinate, DirectoryCopy, Distance, ProviderRecord};
pub use requests::{DirectoryQuery, MapQuery};
pub use responses::{DirectoryResponse, ErrorResponse, HealthResponse, MapResponse};
