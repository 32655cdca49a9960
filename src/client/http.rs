use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::ClientError;
use super::traits::{AnalysisClient, DocumentClient, Encryptor, UploadClient};
use crate::auth::{
    normalize_public_key, AuthResponse, EncryptedCredentials, LoginRequest, PublicKeyResponse,
    RegisterRequest,
};
use crate::config::ClientConfig;
use crate::models::{AnalysisReport, DocumentId, DocumentRecord, Finding};
use crate::pipeline::import::{FileHandle, UploadMetadata};
use crate::share::{ShareRequest, UserSummary};

const FALLBACK_MIME: &str = "application/octet-stream";

/// HTTP client for the document backend.
///
/// Holds the session token; a 401 from any endpoint drops it.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
    public_key: Option<String>,
    timeout_secs: u64,
}

/// Response body of `GET /api/documents/{id}/analysis`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse {
    sensitivity_score: u32,
    #[serde(default)]
    findings: Vec<Finding>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: RwLock::new(None),
            public_key: None,
            timeout_secs,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut api = Self::new(&config.api_url, config.timeout_secs)?;
        api.public_key = config.public_key.clone();
        if let Some(token) = &config.token {
            api.set_token(token);
        }
        Ok(api)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: &str) {
        *self.token.write().unwrap_or_else(|p| p.into_inner()) = Some(token.to_string());
    }

    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(|p| p.into_inner()) = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %response.url(), "Session rejected, dropping token");
            self.clear_token();
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T, ClientError> {
        response
            .json()
            .await
            .map_err(|e| ClientError::ResponseParsing(e.to_string()))
    }

    /// Colleagues offered by the share dialog.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ClientError> {
        let response = self.send(self.client.get(self.url("/api/users"))).await?;
        self.json(response).await
    }

    /// Server public key as a PEM block. A configured key wins over the
    /// endpoint.
    pub async fn public_key(&self) -> Result<String, ClientError> {
        if let Some(key) = &self.public_key {
            return Ok(normalize_public_key(key));
        }
        let response = self
            .send(self.client.get(self.url("/auth/public-key")))
            .await?;
        let parsed: PublicKeyResponse = self.json(response).await?;
        Ok(normalize_public_key(&parsed.public_key))
    }

    pub async fn login(
        &self,
        encryptor: &dyn Encryptor,
        request: &LoginRequest,
    ) -> Result<AuthResponse, ClientError> {
        let key = self.public_key().await?;
        let body = EncryptedCredentials {
            email: None,
            username: &request.username,
            password: encryptor.encrypt(&key, &request.password).await?,
        };
        self.authenticate("/auth/login", &body).await
    }

    pub async fn register(
        &self,
        encryptor: &dyn Encryptor,
        request: &RegisterRequest,
    ) -> Result<AuthResponse, ClientError> {
        let key = self.public_key().await?;
        let body = EncryptedCredentials {
            email: Some(&request.email),
            username: &request.username,
            password: encryptor.encrypt(&key, &request.password).await?,
        };
        self.authenticate("/auth/register", &body).await
    }

    async fn authenticate(
        &self,
        path: &str,
        body: &EncryptedCredentials<'_>,
    ) -> Result<AuthResponse, ClientError> {
        let response = self
            .send(self.client.post(self.url(path)).json(body))
            .await?;
        let auth: AuthResponse = self.json(response).await?;
        self.set_token(&auth.token);
        tracing::info!(username = %body.username, "Authenticated");
        Ok(auth)
    }
}

#[async_trait]
impl UploadClient for ApiClient {
    async fn upload(
        &self,
        file: &FileHandle,
        metadata: &UploadMetadata,
    ) -> Result<DocumentRecord, ClientError> {
        let bytes = file
            .read_bytes()
            .await
            .map_err(|e| ClientError::File(e.to_string()))?;
        let mime = if file.mime_type().is_empty() {
            FALLBACK_MIME
        } else {
            file.mime_type()
        };
        let part = Part::bytes(bytes)
            .file_name(file.name().to_string())
            .mime_str(mime)
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let classification = &metadata.classification;
        let mut form = Form::new()
            .part("file", part)
            .text("documentType", classification.document_type.as_str())
            .text("securityLevel", classification.security_level.as_str())
            .text("department", classification.department.as_str());
        if let Some(notes) = &classification.notes {
            form = form.text("notes", notes.clone());
        }

        let response = self
            .send(self.client.post(self.url("/api/documents")).multipart(form))
            .await?;
        let record: DocumentRecord = self.json(response).await?;
        tracing::debug!(doc_id = %record.id(), name = %record.name(), "Upload accepted");
        record
            .normalized()
            .map_err(|e| ClientError::ResponseParsing(e.to_string()))
    }
}

#[async_trait]
impl AnalysisClient for ApiClient {
    async fn analysis(&self, id: &DocumentId) -> Result<AnalysisReport, ClientError> {
        let url = self.url(&format!("/api/documents/{id}/analysis"));
        let response = match self.send(self.client.get(url)).await {
            Err(ClientError::Status { status: 404, .. }) => return Err(ClientError::NotReady),
            other => other?,
        };
        let parsed: AnalysisResponse = self.json(response).await?;
        AnalysisReport::new(parsed.sensitivity_score, parsed.findings)
            .map_err(|e| ClientError::ResponseParsing(e.to_string()))
    }
}

#[async_trait]
impl DocumentClient for ApiClient {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ClientError> {
        let response = self
            .send(self.client.get(self.url("/api/documents")))
            .await?;
        let records: Vec<DocumentRecord> = self.json(response).await?;
        records
            .into_iter()
            .map(DocumentRecord::normalized)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ClientError::ResponseParsing(e.to_string()))
    }

    async fn delete_document(&self, id: &DocumentId) -> Result<(), ClientError> {
        let url = self.url(&format!("/api/documents/{id}"));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn download_document(&self, id: &DocumentId) -> Result<Vec<u8>, ClientError> {
        let url = self.url(&format!("/api/documents/{id}/download"));
        let response = self.send(self.client.get(url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(e, &self.base_url, self.timeout_secs))?;
        Ok(bytes.to_vec())
    }

    async fn share_document(&self, request: &ShareRequest) -> Result<(), ClientError> {
        let url = self.url(&format!("/api/documents/{}/share", request.document_id));
        self.send(self.client.post(url).json(request)).await?;
        Ok(())
    }
}
