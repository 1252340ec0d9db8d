use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use iroh::discovery::pkarr::dht::DhtDiscovery;
use iroh::{Endpoint, SecretKey};

const RELAY_WAIT: Duration = Duration::from_secs(10);

pub async fn create_endpoint(socket_addr: SocketAddr, secret_key: SecretKey) -> Result<Endpoint> {
    let ip = match socket_addr {
        SocketAddr::V4(addr) => *addr.ip(),
        SocketAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
    };
    let addr = SocketAddrV4::new(ip, socket_addr.port());

    // peers resolve each other by node id over the mainline dht
    let mainline_discovery = DhtDiscovery::builder()
        .secret_key(secret_key.clone())
        .build()?;

    let endpoint = Endpoint::builder()
        .secret_key(secret_key)
        .discovery(Box::new(mainline_discovery))
        .bind_addr_v4(addr)
        .bind()
        .await?;
    Ok(endpoint)
}

/// Wait until the endpoint has been assigned a home relay
pub async fn await_relay_region(endpoint: &Endpoint) -> Result<()> {
    let t0 = Instant::now();
    loop {
        let addr = endpoint.node_addr().await?;

        if addr.relay_url().is_some() {
            return Ok(());
        }
        if t0.elapsed() > RELAY_WAIT {
            return Err(anyhow!(
                "no relay assigned after {} seconds",
                RELAY_WAIT.as_secs()
            ));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
