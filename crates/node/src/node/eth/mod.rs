mod contracts;
mod porcelain;
mod vouchers;

pub use porcelain::EthPorcelain;
