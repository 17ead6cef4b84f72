use crate::operation::{api_error, retry_after, OperationState, OperationStatusBody, PendingOperation};
use crate::{ArmConfig, ArmError, ArmResult, TokenCredential};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

/// JSON client for the Azure Resource Manager endpoint.
pub struct ArmClient {
    http: Client,
    config: ArmConfig,
    credential: Arc<dyn TokenCredential>,
}

impl ArmClient {
    pub fn new(http: Client, config: ArmConfig, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            http,
            config,
            credential,
        }
    }

    pub fn http_client(config: &ArmConfig) -> ArmResult<Client> {
        Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("vmrename/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArmError::Http(format!("failed to build http client: {e}")))
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    async fn request(&self, method: Method, url: &str) -> ArmResult<RequestBuilder> {
        let token = self.credential.token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// GET a resource; 404 is `None`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> ArmResult<Option<T>> {
        debug!(%url, "GET");
        let response = self.request(Method::GET, url.as_str()).await?.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        decode(response).await.map(Some)
    }

    /// PUT a resource and wait until its provisioning finishes; returns the
    /// final state of the resource.
    pub async fn put_json<B, T>(&self, url: &Url, body: &B) -> ArmResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%url, "PUT");
        let response = self
            .request(Method::PUT, url.as_str())
            .await?
            .json(body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        if let Some(pending) = PendingOperation::from_headers(response.headers()) {
            let initial_delay = retry_after(response.headers());
            self.wait_for_operation(pending, initial_delay).await?;
            return self
                .get_json(url)
                .await?
                .ok_or_else(|| ArmError::Decode(format!("resource {url} vanished after PUT")));
        }

        decode(response).await
    }

    /// DELETE a resource and wait for the deletion to finish. Deleting a
    /// resource that does not exist succeeds.
    pub async fn delete(&self, url: &Url) -> ArmResult<()> {
        debug!(%url, "DELETE");
        let response = self.request(Method::DELETE, url.as_str()).await?.send().await?;

        if response.status() == StatusCode::NO_CONTENT || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let response = ensure_success(response).await?;

        let pending = match PendingOperation::from_headers(response.headers()) {
            Some(pending) => pending,
            None if response.status() == StatusCode::ACCEPTED => {
                PendingOperation::ResourceDeletion(url.to_string())
            }
            None => return Ok(()),
        };
        let initial_delay = retry_after(response.headers());
        self.wait_for_operation(pending, initial_delay).await
    }

    /// Poll until the operation is terminal. Each sleep is capped at the time
    /// left, so the last poll lands on the deadline.
    async fn wait_for_operation(
        &self,
        pending: PendingOperation,
        initial_delay: Option<std::time::Duration>,
    ) -> ArmResult<()> {
        let deadline = Instant::now() + self.config.operation_timeout;
        let mut delay = initial_delay.unwrap_or(self.config.poll_interval);

        info!(operation = %pending.url(), "Waiting for long-running operation");

        loop {
            sleep_until((Instant::now() + delay).min(deadline)).await;

            let response = self
                .request(Method::GET, pending.url())
                .await?
                .send()
                .await?;
            let next_delay = retry_after(response.headers()).unwrap_or(self.config.poll_interval);

            let done = match &pending {
                PendingOperation::AsyncOperation(_) => {
                    let body: OperationStatusBody = decode(ensure_success(response).await?).await?;
                    debug!(status = %body.status, "Operation status");
                    body.state()? == OperationState::Succeeded
                }
                PendingOperation::Location(_) => {
                    ensure_success(response).await?.status() != StatusCode::ACCEPTED
                }
                PendingOperation::ResourceDeletion(_) => {
                    if response.status() == StatusCode::NOT_FOUND {
                        true
                    } else {
                        ensure_success(response).await?;
                        false
                    }
                }
            };

            if done {
                info!(operation = %pending.url(), "Long-running operation finished");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ArmError::Timeout(format!(
                    "operation {} did not finish within {}s",
                    pending.url(),
                    self.config.operation_timeout.as_secs()
                )));
            }
            delay = next_delay;
        }
    }
}

async fn ensure_success(response: Response) -> ArmResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> ArmResult<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ArmError::Decode(e.to_string()))
}
