pub mod errors;
pub mod loader;
pub mod report;
pub mod svg;

pub use errors::FrontendError;
pub use loader::{CurrentPreview, LoadedPreview, load_preview, preview_files};
