//! Client for the shared JSON document service.
//!
//! Reads `GET {base}/{document}/latest`, which answers `{ "record": { "posts": [...], "lastUpdated": ... } }`,
//! and replaces the document with `PUT {base}/{document}` carrying `{ "posts": [...], "lastUpdated": ... }`.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::application::repos::{RemoteError, RemoteStore};
use crate::domain::posts::Post;

pub const ACCESS_KEY_HEADER: &str = "X-Master-Key";

#[derive(Debug, Deserialize)]
struct LatestEnvelope {
    #[serde(default)]
    record: Option<StoredDocument>,
}

#[derive(Debug, Deserialize)]
struct StoredDocument {
    #[serde(default)]
    posts: Option<Vec<Post>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentBody<'a> {
    posts: &'a [Post],
    #[serde(with = "time::serde::rfc3339")]
    last_updated: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct JsonBinStore {
    client: Client,
    read_url: Url,
    write_url: Url,
    access_key: Option<String>,
}

impl JsonBinStore {
    pub fn new(
        base: &Url,
        document_id: &str,
        access_key: Option<String>,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Self::with_client(client, base, document_id, access_key)
    }

    pub fn with_client(
        client: Client,
        base: &Url,
        document_id: &str,
        access_key: Option<String>,
    ) -> Result<Self, RemoteError> {
        let write_url = document_url(base, &[document_id])?;
        let read_url = document_url(base, &[document_id, "latest"])?;
        Ok(Self {
            client,
            read_url,
            write_url,
            access_key,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("corkboard/", env!("CARGO_PKG_VERSION"))
    }

    pub fn read_url(&self) -> &Url {
        &self.read_url
    }

    pub fn write_url(&self) -> &Url {
        &self.write_url
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let request = self.client.request(method, url.clone());
        match self.access_key.as_deref() {
            Some(key) => request.header(ACCESS_KEY_HEADER, key),
            None => request,
        }
    }
}

#[async_trait]
impl RemoteStore for JsonBinStore {
    async fn load(&self) -> Result<Vec<Post>, RemoteError> {
        let response = self.request(Method::GET, &self.read_url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url = %self.read_url, "No shared document yet; starting fresh");
            return Ok(Vec::new());
        }

        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let envelope: LatestEnvelope =
            serde_json::from_slice(&bytes).map_err(RemoteError::malformed)?;
        Ok(envelope
            .record
            .and_then(|document| document.posts)
            .unwrap_or_default())
    }

    async fn save(&self, posts: &[Post]) -> Result<(), RemoteError> {
        let body = DocumentBody {
            posts,
            last_updated: OffsetDateTime::now_utc(),
        };
        let response = self
            .request(Method::PUT, &self.write_url)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(())
    }
}

/// Remote used when the shared document is switched off; every call reports it as unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRemote;

#[async_trait]
impl RemoteStore for DisabledRemote {
    async fn load(&self) -> Result<Vec<Post>, RemoteError> {
        Err(RemoteError::Disabled)
    }

    async fn save(&self, _posts: &[Post]) -> Result<(), RemoteError> {
        Err(RemoteError::Disabled)
    }
}

fn document_url(base: &Url, segments: &[&str]) -> Result<Url, RemoteError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| RemoteError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
