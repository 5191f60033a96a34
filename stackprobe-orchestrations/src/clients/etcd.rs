//! Coordination service (etcd v2 keys API) client

use async_trait::async_trait;
use reqwest::StatusCode;
use stackprobe_models::SubnetListing;

use super::CoordinationService;
use crate::error::ClientError;
use crate::names::etcd;

pub struct EtcdClient {
    http: reqwest::Client,
    port: u16,
    api_version: String,
    namespace: String,
}

impl Default for EtcdClient {
    fn default() -> Self {
        Self::new(etcd::CLIENT_PORT)
    }
}

impl EtcdClient {
    pub fn new(port: u16) -> Self {
        Self {
            http: reqwest::Client::new(),
            port,
            api_version: etcd::API_VERSION.to_string(),
            namespace: etcd::NETWORK_NAMESPACE.to_string(),
        }
    }

    /// `http://{address}:{port}/{api}/keys/{namespace}/subnets`
    pub fn subnets_url(&self, address: &str) -> String {
        format!(
            "http://{}:{}/{}/keys/{}/subnets",
            address, self.port, self.api_version, self.namespace
        )
    }
}

#[async_trait]
impl CoordinationService for EtcdClient {
    async fn subnet_count(&self, address: &str) -> Result<usize, ClientError> {
        let url = self.subnets_url(address);
        let transport = |source| ClientError::Transport { url: url.clone(), source };

        let response = self.http.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        if status != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus { url, status: status.as_u16() });
        }

        let listing: SubnetListing = serde_json::from_slice(&body)
            .map_err(|source| ClientError::Decode { url: url.clone(), source })?;
        Ok(listing.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_subnets_url_layout() {
        let client = EtcdClient::default();
        assert_eq!(
            client.subnets_url("10.0.0.5"),
            "http://10.0.0.5:2379/v2/keys/coreos.com/network/subnets"
        );
    }

    #[tokio::test]
    async fn test_subnet_count_counts_child_nodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/keys/coreos.com/network/subnets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "action": "get",
                "node": {
                    "key": "/coreos.com/network/subnets",
                    "dir": true,
                    "nodes": [
                        {"key": "/coreos.com/network/subnets/10.244.1.0-24", "value": "{}"},
                        {"key": "/coreos.com/network/subnets/10.244.2.0-24", "value": "{}"},
                        {"key": "/coreos.com/network/subnets/10.244.3.0-24", "value": "{}"}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = EtcdClient::new(server.address().port());
        let count = client.subnet_count("127.0.0.1").await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_subnet_count_missing_directory_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errorCode": 100})))
            .mount(&server)
            .await;

        let client = EtcdClient::new(server.address().port());
        let err = client.subnet_count("127.0.0.1").await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedStatus { status: 404, .. }));
    }
}
