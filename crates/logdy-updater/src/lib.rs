//! Background version-check helper.
//!
//! Checks the latest published release against the compiled-in version
//! once per run, and makes the result available for `/api/status`'s
//! `update_version` field. A [`ReleaseSource`] abstracts the network call so
//! tests can supply a fake release list.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use logdy_protocol::VersionUpdateInfo;
use semver::Version;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateCheckError {
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed release manifest")]
    Malformed,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that can answer "what's the latest released version". The
/// GitHub-backed implementation lives behind this trait so tests can inject
/// a deterministic fake.
pub trait ReleaseSource: Send + Sync {
    fn latest_version(&self) -> BoxFuture<'_, Result<(String, Option<String>), UpdateCheckError>>;
}

/// Queries a GitHub repository's latest release tag.
pub struct GithubReleaseSource {
    client: reqwest::Client,
    owner: String,
    repo: String,
}

impl GithubReleaseSource {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl ReleaseSource for GithubReleaseSource {
    fn latest_version(&self) -> BoxFuture<'_, Result<(String, Option<String>), UpdateCheckError>> {
        Box::pin(async move {
            let url = format!(
                "https://api.github.com/repos/{}/{}/releases/latest",
                self.owner, self.repo
            );
            let resp = self
                .client
                .get(url)
                .header("User-Agent", "logdy")
                .send()
                .await
                .map_err(|e| UpdateCheckError::Network(e.to_string()))?;
            let body: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| UpdateCheckError::Network(e.to_string()))?;
            let tag = body
                .get("tag_name")
                .and_then(|v| v.as_str())
                .ok_or(UpdateCheckError::Malformed)?;
            let download_link = body
                .get("html_url")
                .and_then(|v| v.as_str())
                .map(str::to_owned);
            Ok((tag.trim_start_matches('v').to_owned(), download_link))
        })
    }
}

/// Compare `local_version` against whatever `source` reports.
///
/// Network failures and unparsable versions both degrade to `checked:
/// false` rather than propagating an error — a failed update check must
/// never block startup or crash the process.
pub async fn check_once(source: &dyn ReleaseSource, local_version: &str) -> VersionUpdateInfo {
    let Ok((current, download_link)) = source.latest_version().await else {
        return VersionUpdateInfo {
            checked: false,
            local_version: local_version.to_owned(),
            ..VersionUpdateInfo::default()
        };
    };

    let parsed_ok = Version::parse(local_version).is_ok() && Version::parse(&current).is_ok();
    VersionUpdateInfo {
        checked: parsed_ok,
        local_version: local_version.to_owned(),
        current_version: current,
        download_link,
    }
}

/// Runs one check and stores the result in `slot`, where `/api/status`
/// reads it from. Intended to be spawned once at startup, not on a timer.
pub async fn run_update_checker(
    source: Arc<dyn ReleaseSource>,
    local_version: String,
    slot: Arc<RwLock<VersionUpdateInfo>>,
) {
    let result = check_once(source.as_ref(), &local_version).await;
    *slot.write().await = result;
}
