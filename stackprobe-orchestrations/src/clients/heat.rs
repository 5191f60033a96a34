//! Heat API client

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use stackprobe_models::{
    CreateStackResponse, StackDetailsResponse, StackHandle, StackRequest, StackStatus,
};
use std::sync::Arc;

use super::{CredentialProvider, StackService, AUTH_TOKEN_HEADER};
use crate::error::ClientError;

pub struct HeatClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HeatClient {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, credentials)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, credentials }
    }

    pub fn stacks_url(&self) -> String {
        format!("{}/stacks", self.base_url)
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.credentials.token().await?;
        Ok(builder
            .header(AUTH_TOKEN_HEADER, token.id)
            .header(CONTENT_TYPE, "application/json"))
    }

    /// Send the request and return the status code plus raw body
    async fn send(
        &self,
        url: &str,
        builder: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), ClientError> {
        let transport = |source| ClientError::Transport { url: url.to_string(), source };

        let response = self.authorized(builder).await?.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;
        Ok((status, body.to_vec()))
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl StackService for HeatClient {
    async fn create_stack(&self, request: &StackRequest) -> Result<StackHandle, ClientError> {
        let url = self.stacks_url();
        let (status, body) = self.send(&url, self.http.post(&url).json(request)).await?;

        if status != StatusCode::CREATED {
            return Err(ClientError::UnexpectedStatus { url, status: status.as_u16() });
        }

        let created: CreateStackResponse = decode(&url, &body)?;
        created.into_handle().ok_or(ClientError::MissingLink { url })
    }

    async fn stack_status(&self, handle: &StackHandle) -> Result<StackStatus, ClientError> {
        let url = handle.url();
        let (status, body) = self.send(url, self.http.get(url)).await?;

        if status != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let details: StackDetailsResponse = decode(url, &body)?;
        Ok(StackStatus::from(details.stack))
    }

    async fn delete_stack(&self, handle: &StackHandle) -> Result<(), ClientError> {
        let url = handle.url();
        let (status, _) = self.send(url, self.http.delete(url)).await?;

        if status != StatusCode::NO_CONTENT {
            return Err(ClientError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
