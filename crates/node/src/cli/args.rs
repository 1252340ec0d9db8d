use std::error::Error;

use clap::Subcommand;

use super::ops::Deals as DealsOp;
use super::ops::Init as InitOp;
use super::ops::Node as NodeOp;
use super::ops::Propose as ProposeOp;
use super::ops::Query as QueryOp;
use super::ops::Status as StatusOp;
use super::ops::Vouchers as VouchersOp;

pub use clap::Parser;

use std::fmt;

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute().await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }
    };
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Make storage deals with jax miners", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

use crate::command_enum;

command_enum! {
    (Init, InitOp),
    (Node, NodeOp),
    (Status, StatusOp),
    (Propose, ProposeOp),
    (Query, QueryOp),
    (Vouchers, VouchersOp),
    (Deals, DealsOp),
}

impl fmt::Display for OpOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpOutput::Init((node_id, eth_address)) => write!(
                f,
                "device initialized with node id: {} and wallet: {}",
                node_id, eth_address
            ),
            OpOutput::Node(_) => write!(f, ""),
            OpOutput::Status(output) => write!(f, "{}", output),
            OpOutput::Propose(output) => write!(f, "{}", output),
            OpOutput::Query(output) => write!(f, "{}", output),
            OpOutput::Vouchers(output) => write!(f, "{}", output),
            OpOutput::Deals(output) => write!(f, "{}", output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propose_parses_positional_terms() {
        let hash = iroh_blobs::Hash::new(b"data");
        let args = Args::try_parse_from([
            "jax",
            "propose",
            "0x4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d",
            &hash.to_string(),
            "1",
            "3",
            "--allow-duplicates",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Propose(_)));
    }

    #[test]
    fn init_requires_contracts() {
        assert!(Args::try_parse_from(["jax", "init"]).is_err());
        let args = Args::try_parse_from([
            "jax",
            "init",
            "--market",
            "0x0101010101010101010101010101010101010101",
            "--payment-broker",
            "0x0202020202020202020202020202020202020202",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Init(_)));
    }
}
