mod api_client;
mod deals;
mod init;
mod node;
mod propose;
mod query;
mod status;
mod vouchers;

pub use deals::Deals;
pub use init::Init;
pub use node::Node;
pub use propose::Propose;
pub use query::Query;
pub use status::Status;
pub use vouchers::Vouchers;
