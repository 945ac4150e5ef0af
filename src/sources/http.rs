use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, Response};

use crate::errors::FeederResult;
use crate::sources::traits::{HttpResponse, HttpTransport};

/// `reqwest` client built once per process and shared by every fetch task.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> FeederResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    fn etag_of(response: &Response) -> Option<String> {
        response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn head(&self, url: &str, validator: &str) -> FeederResult<HttpResponse> {
        let response = self
            .client
            .head(url)
            .header(IF_NONE_MATCH, validator)
            .send()
            .await?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
            etag: Self::etag_of(&response),
            body: Vec::new(),
        })
    }

    async fn get(&self, url: &str) -> FeederResult<HttpResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let etag = Self::etag_of(&response);

        // Only a 200 body is ever parsed
        let body = if status == 200 {
            response.bytes().await?.to_vec()
        } else {
            Vec::new()
        };

        Ok(HttpResponse { status, etag, body })
    }
}
