mod blob_server_client;

pub use blob_server_client::HttpBlobService;
