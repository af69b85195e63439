mod fetch_blob;
mod stat_blobs;
mod sync_files;
mod upload_blobs;

pub use fetch_blob::{FetchBlobUseCase, FetchError, FetchedBlob};
pub use stat_blobs::{StatBlobsUseCase, StatError};
pub use sync_files::{join_url, SyncError, SyncFilesUseCase};
pub use upload_blobs::{UploadBlobsUseCase, UploadError};
