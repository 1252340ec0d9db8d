mod blobs_service;
mod endpoint;
mod host;
mod router;

pub use blobs_service::BlobsService;
pub use endpoint::{await_relay_region, create_endpoint};
pub use host::IrohClientNode;
pub use router::router;
