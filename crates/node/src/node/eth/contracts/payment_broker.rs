use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash, U256},
    providers::{ProviderBuilder, WsConnect},
    signers::local::PrivateKeySigner,
    sol,
};
use anyhow::{anyhow, Result};
use url::Url;

/// Least gas any transaction can be given
const MIN_TX_GAS: u64 = 21_000;

sol! {
    #[sol(rpc)]
    contract PaymentBroker {
        event ChannelCreated(uint256 indexed channel, address indexed payer, address indexed target, uint256 amount, uint64 eol);

        function createChannel(address target, uint64 eol) external payable returns (uint256 channel);
    }
}

/// A channel opened on the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedChannel {
    pub channel: U256,
    pub tx_hash: TxHash,
}

#[derive(Clone)]
pub struct PaymentBrokerContract {
    ws_url: Url,
    private_key: PrivateKeySigner,
    address: Address,
}

impl PaymentBrokerContract {
    pub fn new(address: Address, ws_url: &Url, private_key: &PrivateKeySigner) -> Self {
        Self {
            address,
            ws_url: ws_url.clone(),
            private_key: private_key.clone(),
        }
    }

    /// Lock `value` in a channel towards `target` that the payer may reclaim
    /// after height `eol`.
    ///
    /// A zero gas price, or a gas limit below what any transaction needs,
    /// leaves that field to the provider's estimate.
    pub async fn create_channel(
        &self,
        target: Address,
        eol: u64,
        value: U256,
        gas_price: U256,
        gas_limit: u64,
    ) -> Result<OpenedChannel> {
        let provider = ProviderBuilder::new()
            .with_chain(alloy_chains::NamedChain::AnvilHardhat)
            .wallet(EthereumWallet::from(self.private_key.clone()))
            .on_ws(WsConnect::new(self.ws_url.as_str()))
            .await?;

        let broker = PaymentBroker::new(self.address, provider);
        let mut call = broker
            .createChannel(target, eol)
            .from(self.private_key.address())
            .value(value);
        if !gas_price.is_zero() {
            let gas_price = u128::try_from(gas_price)
                .map_err(|_| anyhow!("gas price {} out of range", gas_price))?;
            call = call.gas_price(gas_price);
        }
        if gas_limit >= MIN_TX_GAS {
            call = call.gas(gas_limit);
        }

        let receipt = call.send().await?.get_receipt().await?;
        if !receipt.status() {
            return Err(anyhow!(
                "channel creation reverted in {}",
                receipt.transaction_hash
            ));
        }

        let channel = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| log.log_decode::<PaymentBroker::ChannelCreated>().ok())
            .map(|event| event.inner.data.channel)
            .ok_or_else(|| anyhow!("no ChannelCreated event in {}", receipt.transaction_hash))?;

        Ok(OpenedChannel {
            channel,
            tx_hash: receipt.transaction_hash,
        })
    }
}
