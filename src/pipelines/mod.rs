pub mod delete;
pub mod upload;

pub use delete::DeletePipeline;
pub use upload::UploadPipeline;
