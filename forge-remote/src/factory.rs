use std::sync::Arc;
use std::time::Duration;

use log::debug;
use url::Url;

use crate::http::{Http, USER_AGENT};
use crate::{GitlabApi, RemoteError, RemoteResult};

/// Resolves the user a call is made for to a GitLab client acting as that
/// user. `None` means the administrator.
pub trait ClientFactory: Send + Sync {
    fn client(&self, user_id: Option<u64>) -> RemoteResult<Arc<dyn GitlabApi>>;
}

/// Hands out clients that impersonate users through GitLab's `Sudo` header,
/// authenticated with a single administrator token. All clients share one
/// connection pool.
#[derive(Clone)]
pub struct SudoFactory {
    client: reqwest::Client,
    url: Url,
    token: String,
}

impl SudoFactory {
    pub fn new(url: &str, token: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let url = Url::parse(url).map_err(|e| RemoteError::url(url, e))?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url,
            token: token.into(),
        })
    }

    pub fn from_config(config: &forge_config::Gitlab) -> RemoteResult<Self> {
        Self::new(&config.url, config.private_token.as_str(), config.timeout())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn http(&self, user_id: Option<u64>) -> Http {
        Http::new(self.client.clone(), self.url.clone(), self.token.as_str(), user_id)
    }
}

impl ClientFactory for SudoFactory {
    fn client(&self, user_id: Option<u64>) -> RemoteResult<Arc<dyn GitlabApi>> {
        debug!("GitLab client for user {:?}", user_id);
        Ok(Arc::new(self.http(user_id)))
    }
}
