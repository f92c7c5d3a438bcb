//! services/client/src/adapters/http.rs
//!
//! The API gateway: builds requests against the configured base URL, merges the
//! session's auth headers, and normalizes HTTP and transport failures into
//! `PortError`. Implements the `PrdService` port on top of that.

use std::collections::HashMap;

use async_trait::async_trait;
use prd_client_core::domain::{
    Document, GenerationRequest, RegisteredAccount, Registration, UserProfile,
};
use prd_client_core::ports::{PortError, PortResult, PrdService};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::records::{
    DocumentRecord, GenerationRecord, ProfileRecord, RegisteredRecord, RegistrationRecord,
    TokenRecord,
};
use crate::session::{bearer, SessionStore};

//=========================================================================================
// Request Description
//=========================================================================================

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// Everything the gateway needs to issue one call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Applied after the session headers, so they win on conflict.
    pub headers: HashMap<String, String>,
    /// Skip the session's bearer token (login and registration).
    pub anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: HashMap::new(),
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

//=========================================================================================
// The Gateway
//=========================================================================================

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    session: SessionStore,
}

impl HttpGateway {
    /// Creates a gateway. Requests have no client-side deadline.
    pub fn new(base_url: Url, session: SessionStore) -> PortResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to create client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    fn build_url(&self, path: &str) -> PortResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| PortError::Unexpected(format!("Bad URL {}: {}", joined, e)))
    }

    /// Issues the request. A 2xx with an empty body yields `None`.
    pub async fn send(&self, request: ApiRequest) -> PortResult<Option<Value>> {
        let url = self.build_url(&request.path)?;
        debug!(method = %request.method, path = %request.path, "Sending API request");

        let mut builder = self.client.request(request.method.clone(), url);
        if !request.anonymous {
            for (name, value) in self.session.auth_headers() {
                if !request.headers.contains_key(&name) {
                    builder = builder.header(name, value);
                }
            }
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                PortError::Network(format!("unable to reach the API: {}", e))
            } else {
                PortError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PortError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = error_detail(&text)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            debug!(status = status.as_u16(), "API request failed");
            return Err(PortError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| PortError::Unexpected(format!("Failed to parse response: {}", e)))
    }

    /// Issues the request and decodes the JSON body into `T`.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> PortResult<T> {
        let body = self
            .send(request)
            .await?
            .ok_or_else(|| PortError::Unexpected("Empty response body".to_string()))?;
        serde_json::from_value(body)
            .map_err(|e| PortError::Unexpected(format!("Failed to parse response: {}", e)))
    }
}

/// Pulls the server's structured `detail` out of an error body. FastAPI sends
/// either a string or a list of validation errors carrying `msg`.
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail").or_else(|| value.get("message"))? {
        Value::String(message) if !message.is_empty() => Some(message.clone()),
        Value::Array(items) => items
            .first()?
            .get("msg")?
            .as_str()
            .map(str::to_string),
        _ => None,
    }
}

fn document_path(id: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("/prd/{}", encoded)
}

//=========================================================================================
// `PrdService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PrdService for HttpGateway {
    async fn login(&self, email: &str, password: &str) -> PortResult<String> {
        let request = ApiRequest::post("/auth/login")
            .form(&[("username", email), ("password", password)])
            .anonymous();
        let token: TokenRecord = self.request(request).await?;
        Ok(token.access_token)
    }

    async fn register(&self, registration: &Registration) -> PortResult<RegisteredAccount> {
        let body = serde_json::to_value(RegistrationRecord {
            full_name: &registration.full_name,
            email: &registration.email,
            password: &registration.password,
        })
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let request = ApiRequest::post("/auth/register").json(body).anonymous();
        match self.send(request).await? {
            Some(value) => serde_json::from_value::<RegisteredRecord>(value)
                .map(RegisteredRecord::to_domain)
                .map_err(|e| PortError::Unexpected(format!("Failed to parse response: {}", e))),
            None => Ok(RegisteredAccount::default()),
        }
    }

    async fn fetch_profile(&self, token: Option<&str>) -> PortResult<UserProfile> {
        let mut request = ApiRequest::get("/users/me");
        if let Some(token) = token {
            request = request.header("Authorization", bearer(token));
        }
        let record: ProfileRecord = self.request(request).await?;
        Ok(record.to_domain())
    }

    async fn generate(&self, request: &GenerationRequest) -> PortResult<Document> {
        let body = serde_json::to_value(GenerationRecord::from_domain(request))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let record: DocumentRecord = self
            .request(ApiRequest::post("/prd/generate").json(body))
            .await?;
        record.to_domain()
    }

    async fn list_documents(&self, skip: usize, limit: usize) -> PortResult<Vec<Document>> {
        let request = ApiRequest::get("/prd/")
            .query("skip", skip)
            .query("limit", limit);
        let records: Vec<DocumentRecord> = self.request(request).await?;
        records.into_iter().map(DocumentRecord::to_domain).collect()
    }

    async fn get_document(&self, id: &str) -> PortResult<Document> {
        let record: DocumentRecord = self.request(ApiRequest::get(document_path(id))).await?;
        record.to_domain()
    }

    async fn delete_document(&self, id: &str) -> PortResult<()> {
        self.send(ApiRequest::delete(document_path(id))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStore;
    use crate::config::AuthMode;
    use mockito::Matcher;
    use prd_client_core::domain::{Format, TemplateType};
    use std::sync::Arc;

    const DOC_JSON: &str = r#"{
        "id": "d1", "title": "Todo App", "content": "hello", "format": "markdown",
        "created_at": "2024-03-01T12:30:00Z", "template_type": "crud_application"
    }"#;

    fn gateway(server: &mockito::Server, token: Option<&str>) -> HttpGateway {
        let session = SessionStore::new(Arc::new(MemoryStore::default()), AuthMode::Enforced);
        if let Some(token) = token {
            session.set_token(token).unwrap();
        }
        let base = Url::parse(&format!("{}/api/v1", server.url())).unwrap();
        HttpGateway::new(base, session).unwrap()
    }

    #[tokio::test]
    async fn list_sends_bearer_and_paging_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/prd/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("skip".into(), "20".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
            ]))
            .match_header("authorization", "Bearer tok-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!("[{}]", DOC_JSON))
            .expect(1)
            .create_async()
            .await;

        let docs = gateway(&server, Some("tok-1"))
            .list_documents(20, 10)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].template_type, TemplateType::CrudApplication);
        assert_eq!(docs[0].format, Format::Markdown);
    }

    #[tokio::test]
    async fn login_is_form_encoded_and_anonymous() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/auth/login")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "ada@example.com".into()),
                Matcher::UrlEncoded("password".into(), "hunter22".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token": "tok-2", "token_type": "bearer"}"#)
            .create_async()
            .await;

        let token = gateway(&server, Some("stale"))
            .login("ada@example.com", "hunter22")
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(token, "tok-2");
    }

    #[tokio::test]
    async fn explicit_bearer_overrides_the_stored_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/users/me")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"{"id": "u1", "email": "ada@example.com", "full_name": "Ada", "is_active": true}"#)
            .create_async()
            .await;

        let user = gateway(&server, Some("stale"))
            .fetch_profile(Some("fresh"))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(user.display_name(), "Ada");
    }

    #[tokio::test]
    async fn server_detail_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/register")
            .with_status(400)
            .with_body(r#"{"detail": "User with this email already exists"}"#)
            .create_async()
            .await;

        let err = gateway(&server, None)
            .register(&Registration {
                full_name: "Ada".into(),
                email: "ada@example.com".into(),
                password: "hunter22".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PortError::Api {
                status: 400,
                message: "User with this email already exists".into()
            }
        );
    }

    #[tokio::test]
    async fn validation_details_and_generic_defaults() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/prd/generate")
            .with_status(422)
            .with_body(r#"{"detail": [{"loc": ["body", "title"], "msg": "field required"}]}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/api/v1/prd/d1")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let gw = gateway(&server, Some("tok"));
        let err = gw
            .generate(&GenerationRequest {
                title: String::new(),
                input_prompt: "x".into(),
                template_type: TemplateType::Custom,
                format: Format::Json,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert!(err.to_string().contains("field required"));

        let err = gw.delete_document("d1").await.unwrap_err();
        assert_eq!(
            err,
            PortError::Api {
                status: 500,
                message: "Request failed with status 500".into()
            }
        );
    }

    #[tokio::test]
    async fn delete_accepts_no_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/v1/prd/d1")
            .match_header("authorization", "Bearer tok")
            .with_status(204)
            .create_async()
            .await;

        gateway(&server, Some("tok"))
            .delete_document("d1")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let session = SessionStore::new(Arc::new(MemoryStore::default()), AuthMode::Enforced);
        let gw = HttpGateway::new(Url::parse("http://127.0.0.1:9/api/v1").unwrap(), session)
            .unwrap();
        let err = gw.list_documents(0, 10).await.unwrap_err();
        assert!(matches!(err, PortError::Network(_)));
    }

    #[test]
    fn document_ids_are_escaped_in_paths() {
        assert_eq!(document_path("d1"), "/prd/d1");
        assert_eq!(document_path("a/b"), "/prd/a%2Fb");
    }
}
