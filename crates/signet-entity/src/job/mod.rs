//! Export job entity.

pub mod model;
pub mod status;

pub use model::{ExportJob, NewExportJob};
pub use status::ExportJobStatus;
