use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const REFRESH_PATH: &str = "/api/v1/auth/refresh-token";

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("session refresh failed: {0}")]
    RefreshFailed(Arc<ClientError>),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn message(&self) -> String {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// 2xx passes, 401 becomes `Unauthorized`, anything else `Status`.
    pub fn into_result(self) -> Result<ApiReply, ClientError> {
        match self.status {
            200..=299 => Ok(self),
            401 => Err(ClientError::Unauthorized {
                message: self.message(),
            }),
            status => Err(ClientError::Status {
                status,
                message: self.message(),
            }),
        }
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiReply, ClientError>;
    /// Exchanges the refresh cookie for a new access token.
    async fn refresh(&self) -> Result<String, ClientError>;
}

/// Talks to the HTTP API. The cookie store keeps the refresh cookie between
/// calls, the way a browser would.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(HttpTransport {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn execute(&self, request: &ApiRequest) -> Result<ApiReply, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.into(), url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?
        };

        Ok(ApiReply { status, body })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiReply, ClientError> {
        self.execute(request).await
    }

    async fn refresh(&self) -> Result<String, ClientError> {
        let reply = self
            .execute(&ApiRequest::new(Method::Post, REFRESH_PATH))
            .await?
            .into_result()?;
        access_token_of(&reply)
    }
}

/// Reads `data.accessToken` from a session envelope.
pub fn access_token_of(reply: &ApiReply) -> Result<String, ClientError> {
    reply
        .body
        .pointer("/data/accessToken")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClientError::Decode("response has no data.accessToken".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_status_mapping() {
        let ok = ApiReply {
            status: 201,
            body: json!({"success": true}),
        };
        assert!(ok.into_result().is_ok());

        let unauthorized = ApiReply {
            status: 401,
            body: json!({"success": false, "message": "Not authorized. Please log in."}),
        };
        match unauthorized.into_result() {
            Err(ClientError::Unauthorized { message }) => {
                assert_eq!(message, "Not authorized. Please log in.")
            }
            other => panic!("unexpected: {:?}", other),
        }

        let forbidden = ApiReply {
            status: 403,
            body: Value::Null,
        };
        assert!(matches!(
            forbidden.into_result(),
            Err(ClientError::Status { status: 403, .. })
        ));
    }

    #[test]
    fn access_token_is_read_from_data() {
        let reply = ApiReply {
            status: 200,
            body: json!({"success": true, "data": {"accessToken": "abc"}}),
        };
        assert_eq!(access_token_of(&reply).unwrap(), "abc");

        let empty = ApiReply {
            status: 200,
            body: json!({"success": true}),
        };
        assert!(matches!(access_token_of(&empty), Err(ClientError::Decode(_))));
    }
}
