//! Storefront backend HTTP client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend answered `success: false`.
    #[error("{0}")]
    Unsuccessful(String),

    /// The envelope reported success but carried no data.
    #[error("response did not include any data")]
    MissingData,

    /// An authenticated call was made without a session token.
    #[error("not signed in; run `storefront login` first")]
    MissingToken,
}

impl ApiError {
    /// The backend-provided message, if the backend rejected the request.
    #[must_use]
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Unsuccessful(message) => Some(message),
            Self::Http(_) | Self::MissingData | Self::MissingToken => None,
        }
    }
}

/// The backend's `{ success, message, data, error }` response envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload of a successful envelope.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Unsuccessful`]: `success` was false.
    /// - [`ApiError::MissingData`]: `data` was absent.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Unsuccessful(
                self.message
                    .or(self.error)
                    .unwrap_or_else(|| "Request failed".to_string()),
            ));
        }

        self.data.ok_or(ApiError::MissingData)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// HTTP client bound to one backend, optionally carrying a session token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl ApiClient {
    /// Create a client for `base_url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http,
        })
    }

    /// Attach a session token for authenticated calls.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Absolute URL for a backend path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET` a bare JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, a non-2xx status or an unreadable body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.http.get(self.url(path))).await
    }

    /// `GET` an enveloped body with the session token and unwrap its data.
    ///
    /// # Errors
    ///
    /// Returns an error when signed out, on HTTP failure, or when the envelope
    /// reports failure.
    pub async fn get_authorized<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.authorize(self.http.get(self.url(path)))?;

        self.execute::<Envelope<T>>(request).await?.into_data()
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, a non-2xx status or an unreadable body.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    /// `POST` a JSON body with the session token and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error when signed out, on HTTP failure, a non-2xx status or
    /// an unreadable body.
    pub async fn post_authorized<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorize(self.http.post(self.url(path)).json(body))?;

        self.execute(request).await
    }

    /// `PATCH` a JSON body with the session token and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error when signed out, on HTTP failure, a non-2xx status or
    /// an unreadable body.
    pub async fn patch_authorized<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorize(self.http.patch(self.url(path)).json(body))?;

        self.execute(request).await
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;

        Ok(request.bearer_auth(token))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;

        debug!(url = %response.url(), status = %response.status(), "backend response");

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json().await?)
    }
}

async fn status_error(response: Response) -> ApiError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or(text);

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use super::*;

    fn client(server: &MockServer) -> Result<ApiClient, ApiError> {
        ApiClient::new(server.uri(), Duration::from_secs(5))
    }

    #[test]
    fn envelope_failure_prefers_message() {
        let envelope: Envelope<Value> = Envelope {
            success: false,
            message: Some("Order not found".to_string()),
            data: None,
            error: Some("ignored".to_string()),
        };

        assert!(matches!(
            envelope.into_data(),
            Err(ApiError::Unsuccessful(message)) if message == "Order not found"
        ));
    }

    #[test]
    fn envelope_success_without_data_is_an_error() {
        let envelope: Envelope<Value> = Envelope {
            success: true,
            message: None,
            data: None,
            error: None,
        };

        assert!(matches!(envelope.into_data(), Err(ApiError::MissingData)));
    }

    #[test]
    fn url_joins_without_double_slash() -> TestResult {
        let api = ApiClient::new("http://shop.test/", Duration::from_secs(1))?;

        assert_eq!(api.url("/api/products"), "http://shop.test/api/products");

        Ok(())
    }

    #[tokio::test]
    async fn authorized_get_sends_bearer_token_and_unwraps_data() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/user-auth/profile"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "data": { "name": "Asha" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server)?.with_token(Some("secret".to_string()));

        let data: Value = api.get_authorized("/api/user-auth/profile").await?;

        assert_eq!(data, json!({ "name": "Asha" }));

        Ok(())
    }

    #[tokio::test]
    async fn authorized_get_without_token_fails_before_sending() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = client(&server)?
            .get_authorized::<Value>("/api/user-auth/profile")
            .await;

        assert!(matches!(result, Err(ApiError::MissingToken)));

        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_carries_backend_message() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/user-auth/sent-otp"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(json!({ "message": "Too many requests" })),
            )
            .mount(&server)
            .await;

        let result = client(&server)?
            .post::<_, Value>("/api/user-auth/sent-otp", &json!({ "phone": "9876543210" }))
            .await;

        assert!(matches!(
            result,
            Err(ApiError::Status { status: 429, ref message }) if message == "Too many requests"
        ));

        Ok(())
    }
}
