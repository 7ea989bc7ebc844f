//! Authenticated GraphQL transport for the Shikimori API.

use super::catalog::{QueryTemplate, Variables};
use super::context::CallContext;
use super::types::{AnimeEnvelope, GraphQlResponse};
use crate::error::TransportError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ORIGIN, USER_AGENT};
use reqwest::{Client, Request};
use serde::Serialize;
use serde_json::{Map, Value};
use shared::config::UpstreamConfig;
use tracing::{debug, warn};

/// Longest upstream error body kept in a `TransportError::Status`
const MAX_ERROR_BODY: usize = 512;

/// Executes a query template against the upstream
///
/// One call per invocation, no retries. Implementations must honour the
/// cancellation and deadline carried by `ctx`.
#[async_trait]
pub trait AnimeTransport: Send + Sync {
    async fn execute(
        &self,
        template: &QueryTemplate,
        variables: &Variables,
        ctx: &CallContext,
    ) -> Result<AnimeEnvelope, TransportError>;
}

/// Bearer credential injected at construction time
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// No token; requests still carry an empty bearer credential and the
    /// upstream decides whether to reject them
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_token(token: Option<String>) -> Self {
        Self { token }
    }

    fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.token.is_some() { "<redacted>" } else { "<none>" };
        f.debug_struct("Credentials").field("token", &state).finish()
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Map<String, Value>,
}

/// Shikimori GraphQL client
#[derive(Debug, Clone)]
pub struct ShikimoriClient {
    /// HTTP client (pools connections internally)
    client: Client,
    /// GraphQL endpoint URL
    endpoint: String,
    /// Origin header value
    origin: String,
    /// User-Agent header value
    user_agent: String,
    credentials: Credentials,
}

impl ShikimoriClient {
    /// Create a new Shikimori client
    pub fn new(
        endpoint: String,
        origin: String,
        user_agent: String,
        credentials: Credentials,
    ) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            origin,
            user_agent,
            credentials,
        })
    }

    /// Create a client from the `[upstream]` config section
    pub fn from_config(config: &UpstreamConfig, credentials: Credentials) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            config.origin.clone(),
            config.user_agent.clone(),
            credentials,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the POST request for a template and its bound variables
    pub fn build_request(
        &self,
        template: &QueryTemplate,
        variables: &Variables,
    ) -> Result<Request, TransportError> {
        let body = GraphQlRequest {
            query: template.query,
            variables: variables.as_map(),
        };

        let request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(ORIGIN, &self.origin)
            .header(USER_AGENT, &self.user_agent)
            .bearer_auth(self.credentials.token())
            .json(&body)
            .build()?;

        Ok(request)
    }

    async fn send(&self, request: Request) -> Result<AnimeEnvelope, TransportError> {
        let response = self.client.execute(request).await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let mut body = String::from_utf8_lossy(&bytes).into_owned();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            warn!(status = %status, "Upstream request failed");
            return Err(TransportError::Status { status, body });
        }

        decode_envelope(&bytes)
    }
}

#[async_trait]
impl AnimeTransport for ShikimoriClient {
    async fn execute(
        &self,
        template: &QueryTemplate,
        variables: &Variables,
        ctx: &CallContext,
    ) -> Result<AnimeEnvelope, TransportError> {
        let request = self.build_request(template, variables)?;
        let bound = Value::Object(variables.as_map().clone());

        debug!(
            operation = %template.operation,
            endpoint = %self.endpoint,
            variables = %bound,
            "Making GraphQL request"
        );

        let envelope = ctx.run(self.send(request)).await?;

        debug!(
            operation = %template.operation,
            count = envelope.animes.len(),
            "GraphQL request successful"
        );
        Ok(envelope)
    }
}

/// Decode a GraphQL response body into the `animes` envelope
///
/// A non-empty `errors` array wins over any partial data.
pub fn decode_envelope(bytes: &[u8]) -> Result<AnimeEnvelope, TransportError> {
    let parsed: GraphQlResponse<AnimeEnvelope> =
        serde_json::from_slice(bytes).map_err(|e| TransportError::Decode(e.to_string()))?;

    if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
        let msg = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TransportError::GraphQl(msg));
    }

    parsed
        .data
        .ok_or_else(|| TransportError::Decode("response carried no data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::catalog::{Operation, QueryCatalog};
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn client_for(endpoint: String, credentials: Credentials) -> ShikimoriClient {
        ShikimoriClient::new(
            endpoint,
            "https://shikimori.one".to_string(),
            "shiki_api_test".to_string(),
            credentials,
        )
        .unwrap()
    }

    fn search_call() -> (&'static QueryTemplate, Variables) {
        let template = QueryCatalog::new().lookup(Operation::Search).unwrap();
        let vars = Variables::new().set("search", "bakemono").set("limit", 10);
        (template, vars)
    }

    /// Read one HTTP request (headers plus content-length body)
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serve a single canned response and hand back the raw request
    async fn serve_once(
        status: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            request
        });
        (format!("http://{}/api/graphql", addr), handle)
    }

    #[test]
    fn test_request_carries_headers_and_body() {
        let client = client_for(
            "https://shikimori.one/api/graphql".to_string(),
            Credentials::bearer("secret"),
        );
        let (template, vars) = search_call();
        let request = client.build_request(template, &vars).unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "https://shikimori.one/api/graphql");

        let headers = request.headers();
        assert_eq!(headers["authorization"], "Bearer secret");
        assert!(headers["authorization"].is_sensitive());
        assert_eq!(headers["accept"], "application/json");
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["origin"], "https://shikimori.one");
        assert_eq!(headers["user-agent"], "shiki_api_test");

        let body: Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["query"], template.query);
        assert_eq!(body["variables"], json!({ "search": "bakemono", "limit": 10 }));
    }

    #[test]
    fn test_missing_token_still_sends_authorization() {
        let client = client_for(
            "https://shikimori.one/api/graphql".to_string(),
            Credentials::anonymous(),
        );
        let (template, vars) = search_call();
        let request = client.build_request(template, &vars).unwrap();
        let auth = request.headers()["authorization"].to_str().unwrap();
        assert_eq!(auth.trim_end(), "Bearer");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let debug = format!("{:?}", Credentials::bearer("secret"));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_decode_envelope() {
        let envelope =
            decode_envelope(br#"{"data": {"animes": [{"id": "1"}, {"id": "2"}]}}"#).unwrap();
        assert_eq!(envelope.animes.len(), 2);

        let body = br#"{"data": {"animes": null}, "errors": [{"message": "bad season"}]}"#;
        let err = decode_envelope(body).unwrap_err();
        assert!(matches!(err, TransportError::GraphQl(msg) if msg == "bad season"));

        let err = decode_envelope(b"<html>").unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));

        let err = decode_envelope(br#"{"data": null}"#).unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_execute_against_local_server() {
        let body = json!({
            "data": { "animes": [{ "id": "42", "name": "Bakemonogatari" }] }
        })
        .to_string();
        let (endpoint, server) = serve_once("200 OK", body).await;

        let client = client_for(endpoint, Credentials::bearer("token-1"));
        let (template, vars) = search_call();
        let envelope = client
            .execute(template, &vars, &CallContext::new())
            .await
            .unwrap();

        assert_eq!(envelope.animes.len(), 1);
        assert_eq!(envelope.animes[0].id, "42");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /api/graphql"));
        assert!(request.contains("authorization: bearer token-1"));
        assert!(request.contains("\"search\":\"bakemono\""));
    }

    #[tokio::test]
    async fn test_execute_with_debug_logging_enabled() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let body = json!({ "data": { "animes": [{ "id": "7" }] } }).to_string();
        let (endpoint, _server) = serve_once("200 OK", body).await;

        let client = client_for(endpoint, Credentials::bearer("token-2"));
        let (template, vars) = search_call();
        let envelope = client
            .execute(template, &vars, &CallContext::new())
            .await
            .unwrap();
        assert_eq!(envelope.animes[0].id, "7");
    }

    #[tokio::test]
    async fn test_execute_maps_http_failure() {
        let body = json!({ "message": "no" }).to_string();
        let (endpoint, _server) = serve_once("401 Unauthorized", body).await;

        let client = client_for(endpoint, Credentials::anonymous());
        let (template, vars) = search_call();
        let err = client
            .execute(template, &vars, &CallContext::new())
            .await
            .unwrap_err();

        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
                assert!(body.contains("no"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_times_out_on_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(stream);
        });

        let client = client_for(format!("http://{}/api/graphql", addr), Credentials::anonymous());
        let (template, vars) = search_call();
        let ctx = CallContext::new().with_timeout(Duration::from_millis(100));

        let err = client.execute(template, &vars, &ctx).await.unwrap_err();
        assert!(matches!(err, TransportError::DeadlineExceeded));
    }
}
