use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};

use super::api::{ApiErrorBody, GetCostAndUsageRequest, GetCostAndUsageResponse};
use super::sigv4::{self, SigningParams};
use super::{api, BillingError, CostSource};
use crate::core::auth::AwsCredentials;

pub const DEFAULT_ENDPOINT: &str = "https://ce.us-east-1.amazonaws.com";
pub const DEFAULT_SIGNING_REGION: &str = "us-east-1";

const SERVICE: &str = "ce";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Validate that a Cost Explorer endpoint uses HTTPS before any credentials
/// are signed against it.
pub fn validate_endpoint(url: &str) -> Result<(), BillingError> {
    if !url.starts_with("https://") {
        return Err(BillingError::InvalidEndpoint(url.to_string()));
    }
    Ok(())
}

/// SigV4-signing client for the Cost Explorer JSON API.
pub struct CostExplorerClient {
    http: Client,
    url: Url,
    host: String,
    signing_region: String,
    credentials: AwsCredentials,
}

impl CostExplorerClient {
    pub fn new(
        credentials: AwsCredentials,
        endpoint: &str,
        signing_region: &str,
    ) -> Result<Self, BillingError> {
        validate_endpoint(endpoint)?;
        let url =
            Url::parse(endpoint).map_err(|_| BillingError::InvalidEndpoint(endpoint.to_string()))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(BillingError::InvalidEndpoint(endpoint.to_string())),
        };

        Ok(Self {
            http: Client::new(),
            url,
            host,
            signing_region: signing_region.to_string(),
            credentials,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl CostSource for CostExplorerClient {
    async fn get_cost_and_usage(
        &self,
        region: &str,
        request: &GetCostAndUsageRequest,
    ) -> Result<GetCostAndUsageResponse, BillingError> {
        let body = serde_json::to_vec(request)?;
        let signed = sigv4::sign(&SigningParams {
            credentials: &self.credentials,
            region: &self.signing_region,
            service: SERVICE,
            host: &self.host,
            content_type: CONTENT_TYPE,
            target: api::TARGET_GET_COST_AND_USAGE,
            body: &body,
            now: Utc::now(),
        });

        tracing::debug!(
            region,
            endpoint = %self.url,
            granularity = %request.granularity,
            "sending GetCostAndUsage"
        );

        let mut builder = self
            .http
            .post(self.url.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", api::TARGET_GET_COST_AND_USAGE)
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            builder = builder.header("X-Amz-Security-Token", token);
        }

        let response = builder.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let (code, message) = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(err) => {
                    let code = err.code();
                    (code, err.message.unwrap_or_default())
                }
                Err(_) => ("UnknownError".to_string(), text),
            };
            return Err(BillingError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> AwsCredentials {
        AwsCredentials {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        }
    }

    #[test]
    fn validate_endpoint_accepts_https() {
        assert!(validate_endpoint("https://ce.us-east-1.amazonaws.com").is_ok());
    }

    #[test]
    fn validate_endpoint_rejects_http() {
        let err = validate_endpoint("http://evil.com").unwrap_err();
        assert!(err.to_string().contains("https://"));
    }

    #[test]
    fn validate_endpoint_rejects_empty_and_no_scheme() {
        assert!(validate_endpoint("").is_err());
        assert!(validate_endpoint("ce.us-east-1.amazonaws.com").is_err());
        assert!(validate_endpoint("file:///etc/passwd").is_err());
    }

    #[test]
    fn client_derives_host_from_endpoint() {
        let client = CostExplorerClient::new(credentials(), DEFAULT_ENDPOINT, "us-east-1").unwrap();
        assert_eq!(client.host(), "ce.us-east-1.amazonaws.com");
    }

    #[test]
    fn client_keeps_explicit_port_in_host() {
        let client =
            CostExplorerClient::new(credentials(), "https://localhost:8443", "us-east-1").unwrap();
        assert_eq!(client.host(), "localhost:8443");
    }

    #[test]
    fn client_rejects_plain_http() {
        assert!(matches!(
            CostExplorerClient::new(credentials(), "http://ce.example.com", "us-east-1"),
            Err(BillingError::InvalidEndpoint(_))
        ));
    }
}
