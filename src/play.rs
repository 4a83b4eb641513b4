use std::{env, fmt, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;

use crate::{
    auth::{Authorizer, Credentials},
    publish::EditsApi,
    util::MediaTypes,
};

pub const DEFAULT_API_URL: &str = "https://androidpublisher.googleapis.com/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Where the credentials come from, before they are loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    AccessToken(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Option<CredentialSource>,
    pub api_url: Url,
    pub timeout: Duration,
    pub media_types: MediaTypes,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds a config from a variable lookup; `PLAYPUSH_ACCESS_TOKEN` wins over
    /// `PLAYPUSH_CREDENTIALS`, which wins over `GOOGLE_APPLICATION_CREDENTIALS`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let credentials = non_empty("PLAYPUSH_ACCESS_TOKEN")
            .map(CredentialSource::AccessToken)
            .or_else(|| {
                non_empty("PLAYPUSH_CREDENTIALS")
                    .or_else(|| non_empty("GOOGLE_APPLICATION_CREDENTIALS"))
                    .map(|p| CredentialSource::File(PathBuf::from(p)))
            });
        let api_url = match non_empty("PLAYPUSH_API_URL") {
            Some(url) => Url::parse(&url).context("PLAYPUSH_API_URL is not a valid URL")?,
            None => Url::parse(DEFAULT_API_URL)?,
        };
        Ok(Self {
            credentials,
            api_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            media_types: MediaTypes::default(),
        })
    }

    pub fn load_credentials(&self) -> Result<Credentials> {
        match &self.credentials {
            Some(CredentialSource::AccessToken(token)) => {
                Ok(Credentials::AccessToken(token.clone()))
            }
            Some(CredentialSource::File(path)) => Credentials::from_file(path),
            None => Err(anyhow!(
                "Missing credentials: pass --credentials <FILE> or set PLAYPUSH_CREDENTIALS \
                 (or GOOGLE_APPLICATION_CREDENTIALS), or provide PLAYPUSH_ACCESS_TOKEN"
            )),
        }
    }
}

/// Server-side transaction that stages listing changes until committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEdit {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time_seconds: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub version_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseStatus {
    Completed,
    Draft,
    Halted,
    InProgress,
    #[serde(other)]
    StatusUnspecified,
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::Draft => "draft",
            Self::Halted => "halted",
            Self::InProgress => "inProgress",
            Self::StatusUnspecified => "statusUnspecified",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRelease {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// int64 values, sent as strings on the wire.
    #[serde(default)]
    pub version_codes: Vec<String>,
    pub status: ReleaseStatus,
}

impl TrackRelease {
    pub fn completed(name: &str, version_code: i64) -> Self {
        Self {
            name: Some(name.to_string()),
            version_codes: vec![version_code.to_string()],
            status: ReleaseStatus::Completed,
        }
    }
}

impl fmt::Display for TrackRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {}",
            self.name.as_deref().unwrap_or("<unnamed>"),
            self.version_codes.join(", "),
            self.status
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub track: String,
    #[serde(default)]
    pub releases: Vec<TrackRelease>,
}

/// Google Play Developer API (androidpublisher v3) edits client.
pub struct PlayPublisherClient {
    http: Client,
    base_url: Url,
    auth: Authorizer,
    media_types: MediaTypes,
}

impl PlayPublisherClient {
    pub fn new(config: &Config) -> Result<Self> {
        let credentials = config.load_credentials()?;
        let http = Client::builder()
            .user_agent(concat!("playpush/", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            auth: Authorizer::new(http.clone(), credentials),
            http,
            base_url: config.api_url.clone(),
            media_types: config.media_types.clone(),
        })
    }

    /// Obtains the first access token so credential problems surface before any edit call.
    pub async fn authorize(&self) -> Result<()> {
        self.auth.bearer().await.context("Failed to authorize")?;
        Ok(())
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let bearer = self.auth.bearer().await?;
        Ok(self
            .http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", bearer)))
    }

    fn edit_url(&self, prefix: &[&str], package_name: &str, rest: &[&str]) -> Result<Url> {
        let mut segments = prefix.to_vec();
        segments.extend(["androidpublisher", "v3", "applications", package_name, "edits"]);
        segments.extend(rest);
        endpoint(&self.base_url, &segments)
    }

    async fn execute<T: DeserializeOwned>(&self, method: Method, req: RequestBuilder) -> Result<T> {
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(anyhow!("{} failed {}: {}", method, status, text));
        }
        debug!(%method, bytes = text.len(), "request ok");
        serde_json::from_str(&text).context("Failed to parse JSON response")
    }
}

/// Appends `segments` to `base`, percent-encoding each one so ids cannot
/// introduce extra path, query or fragment components.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("API URL {} cannot carry a path", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl EditsApi for PlayPublisherClient {
    async fn insert_edit(&self, package_name: &str) -> Result<AppEdit> {
        let url = self.edit_url(&[], package_name, &[])?;
        let req = self.request(Method::POST, url).await?.json(&json!({}));
        self.execute(Method::POST, req).await
    }

    async fn upload_bundle(&self, package_name: &str, edit_id: &str, file: &Path) -> Result<Bundle> {
        let body = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read bundle {}", file.display()))?;
        let content_type = self.media_types.content_type_for(file).to_string();
        debug!(bytes = body.len(), %content_type, "uploading bundle");
        let mut url = self.edit_url(&["upload"], package_name, &[edit_id, "bundles"])?;
        url.query_pairs_mut().append_pair("uploadType", "media");
        let req = self
            .request(Method::POST, url)
            .await?
            .header("Content-Type", content_type)
            .body(body);
        self.execute(Method::POST, req).await
    }

    async fn update_track(
        &self,
        package_name: &str,
        edit_id: &str,
        track: &Track,
    ) -> Result<Track> {
        let url = self.edit_url(
            &[],
            package_name,
            &[edit_id, "tracks", track.track.as_str()],
        )?;
        let req = self.request(Method::PUT, url).await?.json(track);
        self.execute(Method::PUT, req).await
    }

    async fn commit_edit(&self, package_name: &str, edit_id: &str) -> Result<AppEdit> {
        let commit = format!("{}:commit", edit_id);
        let url = self.edit_url(&[], package_name, &[commit.as_str()])?;
        let req = self.request(Method::POST, url).await?;
        self.execute(Method::POST, req).await
    }
}
