//! ALPN identifiers for the storage deal protocols

/// ALPN identifier for proposing a storage deal to a miner
pub const MAKE_DEAL_ALPN: &[u8] = b"/jax/storage/mk/1.0.0";

/// ALPN identifier for querying the state of a proposed deal
pub const QUERY_DEAL_ALPN: &[u8] = b"/jax/storage/qry/1.0.0";

