use crate::gossip::{GossipTransport, NodeId};
use crate::proto::{GossipEntry, MemberView, PingResponse};
use async_trait::async_trait;
use failure::Error;
use reqwest::Client;
use std::time::Duration;

/// HTTP client for the node API, addressed by node id (`<host>:<port>`).
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
}

impl RpcClient {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub async fn push_gossip(&self, peer: &NodeId, entries: &[GossipEntry]) -> Result<(), Error> {
        self.client
            .post(&url(peer, "gossip"))
            .json(entries)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn ping(&self, peer: &NodeId) -> Result<PingResponse, Error> {
        let response = self
            .client
            .get(&url(peer, "ping"))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn list_members(&self, peer: &NodeId) -> Result<Vec<MemberView>, Error> {
        let response = self
            .client
            .get(&url(peer, "members"))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl GossipTransport for RpcClient {
    async fn push(&self, peer: &NodeId, entries: &[GossipEntry]) -> Result<(), Error> {
        self.push_gossip(peer, entries).await
    }
}

fn url(peer: &NodeId, path: &str) -> String {
    format!("http://{}/{}", peer, path)
}
