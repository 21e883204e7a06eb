// src/services/api_client.rs
use std::path::Path;

use reqwest::{Client, Response, multipart};
use serde_json::Value;

use crate::{config::ClientConfig, error::ApiError, message::QueryRequest};

/// Per-call knobs for `query_with`. `None` model means the configured default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub model: Option<String>,
    pub include_recipes: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn include_recipes(mut self, include: bool) -> Self {
        self.include_recipes = include;
        self
    }
}

/// A file held in memory, ready to go into a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).map(str::to_string);
        Self {
            file_name,
            bytes: bytes.into(),
            mime,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    fn into_part(self) -> Result<multipart::Part, ApiError> {
        let part = multipart::Part::bytes(self.bytes).file_name(self.file_name.clone());
        match self.mime {
            Some(mime) => part
                .mime_str(&mime)
                .map_err(|source| ApiError::InvalidMime {
                    file_name: self.file_name,
                    mime,
                    source,
                }),
            None => Ok(part),
        }
    }
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some("text/csv"),
        "json" => Some("application/json"),
        "txt" => Some("text/plain"),
        "fit" | "gpx" | "tcx" => Some("application/octet-stream"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct FitnessApiClient {
    http: Client,
    config: ClientConfig,
}

impl FitnessApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(Client::new(), config)
    }

    pub fn with_http_client(http: Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub fn build_query_request(&self, text: &str, options: &QueryOptions) -> QueryRequest {
        QueryRequest {
            query: text.to_string(),
            system_role: self.config.system_role.clone(),
            top_k: self.config.top_k,
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            include_recipes: options.include_recipes,
        }
    }

    /// Query with the default model and no recipes.
    pub async fn query(&self, text: &str) -> Result<Value, ApiError> {
        self.query_with(text, QueryOptions::default()).await
    }

    /// Returns the backend's JSON body as-is.
    #[tracing::instrument(skip(self, text), fields(model = ?options.model, include_recipes = options.include_recipes))]
    pub async fn query_with(&self, text: &str, options: QueryOptions) -> Result<Value, ApiError> {
        let url = self.config.endpoint("query");
        let body = self.build_query_request(text, &options);

        let result = async {
            let response = self
                .http
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|source| ApiError::Transport {
                    url: url.clone(),
                    source,
                })?;
            read_json(&url, response).await
        }
        .await;

        if let Err(err) = &result {
            tracing::error!(error = %err, "Error querying fitness data");
        }
        result
    }

    /// Sends every file under a repeated `files` field plus one `file_type` field.
    #[tracing::instrument(skip(self, files), fields(count = files.len()))]
    pub async fn upload_files(
        &self,
        files: Vec<UploadFile>,
        file_type: &str,
    ) -> Result<Value, ApiError> {
        if files.is_empty() {
            tracing::error!("Error uploading files: nothing to upload");
            return Err(ApiError::NoFiles);
        }
        let url = self.config.endpoint("upload");

        let result = async {
            let mut form = multipart::Form::new();
            for file in files {
                form = form.part("files", file.into_part()?);
            }
            form = form.text("file_type", file_type.to_string());

            let response = self
                .http
                .post(&url)
                .multipart(form)
                .send()
                .await
                .map_err(|source| ApiError::Transport {
                    url: url.clone(),
                    source,
                })?;
            read_json(&url, response).await
        }
        .await;

        if let Err(err) = &result {
            tracing::error!(error = %err, "Error uploading files");
        }
        result
    }
}

async fn read_json(url: &str, response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        // error bodies are best-effort
        Err(err) if !status.is_success() => {
            tracing::debug!(error = %err, "could not read error body");
            String::new()
        }
        Err(source) => {
            return Err(ApiError::Transport {
                url: url.to_string(),
                source,
            });
        }
    };

    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status,
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| ApiError::InvalidJson {
        url: url.to_string(),
        status,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SYSTEM_ROLE, DEFAULT_TOP_K};
    use crate::state::DEFAULT_MODEL;

    #[test]
    fn query_body_has_exactly_five_fields() {
        let client = FitnessApiClient::new(ClientConfig::default());
        let req = client.build_query_request("how many calories in an egg?", &QueryOptions::new());
        let v = serde_json::to_value(&req).unwrap();
        let obj = v.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["include_recipes", "model", "query", "system_role", "top_k"]
        );
        assert_eq!(obj["query"], "how many calories in an egg?");
        assert_eq!(obj["system_role"], DEFAULT_SYSTEM_ROLE);
        assert_eq!(obj["top_k"], DEFAULT_TOP_K);
        assert_eq!(obj["model"], DEFAULT_MODEL);
        assert_eq!(obj["include_recipes"], false);
    }

    #[test]
    fn options_override_model_and_recipes() {
        let client = FitnessApiClient::new(ClientConfig::default());
        let opts = QueryOptions::new().model("meta/llama-3").include_recipes(true);
        let req = client.build_query_request("dinner ideas", &opts);
        assert_eq!(req.model, "meta/llama-3");
        assert!(req.include_recipes);
    }

    #[test]
    fn upload_file_guesses_mime_from_extension() {
        assert_eq!(
            UploadFile::new("diary.CSV", b"a,b".to_vec()).mime.as_deref(),
            Some("text/csv")
        );
        assert_eq!(UploadFile::new("notes", Vec::new()).mime, None);
        let explicit = UploadFile::new("notes", Vec::new()).with_mime("text/plain");
        assert_eq!(explicit.mime.as_deref(), Some("text/plain"));
    }
}
