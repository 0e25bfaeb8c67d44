//! Outbound HTTP calls to the router

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shengsuanyun_config::{ClientConfig, CredentialsConfig};
use url::Url;

use crate::error::LlmError;

/// Raw response body of a streaming call
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

const REFERER_HEADER: &str = "HTTP-Referer";
const TITLE_HEADER: &str = "X-Title";

/// HTTP client bound to one API root and key
///
/// Every request carries the two identification headers. Failures are
/// returned as-is; nothing is retried.
///
/// The configured timeout bounds connecting and each read. Blocking calls
/// are also bounded as a whole; a streaming body may run for as long as
/// events keep arriving.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    timeout: Duration,
    base_url: Url,
    api_key: SecretString,
    referer: String,
    title: String,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Build a client from credentials and client settings
    ///
    /// An empty API key is accepted here because the model catalogue is
    /// public; calls that need the key check for it themselves.
    pub fn new(credentials: &CredentialsConfig, client: &ClientConfig) -> Result<Self, LlmError> {
        let timeout = client.timeout().map_err(|e| LlmError::Config(e.to_string()))?;
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            timeout,
            base_url: credentials.base_url.clone(),
            api_key: credentials.api_key.clone(),
            referer: client.referer.clone(),
            title: client.title.clone(),
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fail unless a non-blank API key is configured
    pub fn require_api_key(&self) -> Result<(), LlmError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(LlmError::Config("no valid API key provided".to_owned()));
        }
        Ok(())
    }

    /// `POST {base}/{path}` with a JSON body, decoding a JSON response
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self
            .authorized(self.http.post(self.endpoint(path)))
            .timeout(self.timeout)
            .json(body);
        let response = self.send(request, path).await?;
        decode_json(response).await
    }

    /// `POST {base}/{path}` with a JSON body, returning the raw body stream
    pub async fn post_stream<B>(&self, path: &str, body: &B) -> Result<ByteStream, LlmError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.authorized(self.http.post(self.endpoint(path))).json(body);
        let response = self.send(request, path).await?;
        Ok(Box::pin(response.bytes_stream()))
    }

    /// `GET {base}/{path}`, decoding a JSON response
    ///
    /// The bearer token is only attached when `authenticated` is set.
    pub async fn get_json<R>(&self, path: &str, authenticated: bool) -> Result<R, LlmError>
    where
        R: DeserializeOwned,
    {
        let request = self.http.get(self.endpoint(path)).timeout(self.timeout);
        let request = if authenticated {
            self.authorized(request)
        } else {
            self.identified(request)
        };
        let response = self.send(request, path).await?;
        decode_json(response).await
    }

    /// `GET {base}/{path}` with the bearer token, discarding the body
    pub async fn probe(&self, path: &str) -> Result<(), LlmError> {
        let request = self.authorized(self.http.get(self.endpoint(path))).timeout(self.timeout);
        self.send(request, path).await.map(drop)
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    fn identified(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(REFERER_HEADER, &self.referer)
            .header(TITLE_HEADER, &self.title)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        self.identified(request).bearer_auth(self.api_key.expose_secret())
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response, LlmError> {
        tracing::debug!(base_url = %self.base_url, path, "sending request");

        let response = request.send().await.map_err(|e| {
            tracing::error!(path, error = %e, "request failed");
            LlmError::Http(e)
        })?;

        handle_error(response, path).await
    }
}

async fn handle_error(response: Response, path: &str) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (error_type, message) = parse_error_body(&body);
    tracing::warn!(path, status = %status, error_type = %error_type, "api returned error");

    Err(LlmError::Api {
        status: status.as_u16(),
        error_type,
        message,
    })
}

/// Split an `{"error": {"type", "message"}}` body into (type, message)
fn parse_error_body(body: &str) -> (String, String) {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return ("unknown".to_owned(), body.to_owned());
    };

    let error = &json["error"];
    let error_type = error["type"].as_str().unwrap_or("unknown").to_owned();
    let message = error["message"]
        .as_str()
        .or_else(|| error.as_str())
        .unwrap_or(body)
        .to_owned();

    (error_type, message)
}

async fn decode_json<R: DeserializeOwned>(response: Response) -> Result<R, LlmError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| LlmError::ResponseShape(format!("failed to parse response: {e}")))
}
