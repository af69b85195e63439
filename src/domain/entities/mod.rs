mod blob;
mod resource;

pub use blob::{Blob, BlobReader, ContentSource, DeferredReader, OpenFuture};
pub use resource::{filename_from_remote_path, Resource, Resources};
