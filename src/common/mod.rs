pub mod records;
pub mod scope;

pub use records::{FootageInfo, FootageJob, MatchRecord, MediaUpload, ReferenceRecord};
pub use scope::SearchScope;
