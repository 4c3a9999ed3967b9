use async_trait::async_trait;
use log::debug;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::types::*;
use crate::{GitlabApi, RemoteError, RemoteResult};

pub const USER_AGENT: &str = concat!("forge-relay-", env!("CARGO_PKG_VERSION"));
pub const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
pub const SUDO_HEADER: &str = "Sudo";

/// GitLab REST API v4 client acting as one user.
///
/// Every request carries the administrator token. When `sudo` is set the
/// request is performed as that user.
#[derive(Clone)]
pub struct Http {
    pub url: Url,
    pub client: reqwest::Client,
    token: String,
    pub sudo: Option<u64>,
}

impl Http {
    pub fn new(client: reqwest::Client, url: Url, token: impl Into<String>, sudo: Option<u64>) -> Self {
        Self {
            url,
            client,
            token: token.into(),
            sudo,
        }
    }

    /// `{url}/api/v4/{segments...}`, each segment percent-encoded, so branch
    /// names and file paths containing `/` stay a single segment.
    pub fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::url(self.url.as_str(), "cannot be a base URL"))?
            .pop_if_empty()
            .extend(["api", "v4"])
            .extend(segments);
        Ok(url)
    }

    fn project(&self, project_id: u64, rest: &[&str]) -> RemoteResult<Url> {
        let id = project_id.to_string();
        let mut segments = vec!["projects", id.as_str()];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {} (sudo: {:?})", method, url, self.sudo);
        let req = self
            .client
            .request(method, url)
            .header(TOKEN_HEADER, self.token.as_str());
        match self.sudo {
            Some(user) => req.header(SUDO_HEADER, user.to_string()),
            None => req,
        }
    }

    async fn check(req: RequestBuilder) -> RemoteResult<Response> {
        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = match res.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Could not read GitLab error body: {}", e);
                String::new()
            }
        };
        debug!("GitLab answered {}: {}", status, body);
        Err(RemoteError::from_response(status.as_u16(), &body))
    }

    async fn fetch<T: DeserializeOwned>(req: RequestBuilder) -> RemoteResult<T> {
        let res = Self::check(req).await?;
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> RemoteResult<T> {
        Self::fetch(self.request(Method::GET, url)).await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> RemoteResult<T> {
        Self::fetch(self.request(method, url).json(body)).await
    }

    async fn delete(&self, url: Url) -> RemoteResult<()> {
        Self::check(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct BranchRef<'a> {
    branch: &'a str,
    #[serde(rename = "ref")]
    reference: &'a str,
}

#[derive(Serialize)]
struct TagRef<'a> {
    tag_name: &'a str,
    #[serde(rename = "ref")]
    reference: &'a str,
}

#[async_trait]
impl GitlabApi for Http {
    async fn create_branch(&self, project_id: u64, name: &str, source: &str) -> RemoteResult<Branch> {
        let url = self.project(project_id, &["repository", "branches"])?;
        let body = BranchRef {
            branch: name,
            reference: source,
        };
        self.send(Method::POST, url, &body).await
    }

    async fn delete_branch(&self, project_id: u64, name: &str) -> RemoteResult<()> {
        let url = self.project(project_id, &["repository", "branches", name])?;
        self.delete(url).await
    }

    async fn get_branch(&self, project_id: u64, name: &str) -> RemoteResult<Branch> {
        let url = self.project(project_id, &["repository", "branches", name])?;
        self.get(url).await
    }

    async fn list_branches(&self, project_id: u64) -> RemoteResult<Vec<Branch>> {
        let url = self.project(project_id, &["repository", "branches"])?;
        self.get(url).await
    }

    async fn list_tags(&self, project_id: u64) -> RemoteResult<Vec<Tag>> {
        let url = self.project(project_id, &["repository", "tags"])?;
        self.get(url).await
    }

    async fn list_tags_page(&self, project_id: u64, page: Page) -> RemoteResult<Vec<Tag>> {
        let mut url = self.project(project_id, &["repository", "tags"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.page.to_string())
            .append_pair("per_page", &page.per_page.to_string());
        self.get(url).await
    }

    async fn create_tag(&self, project_id: u64, name: &str, reference: &str) -> RemoteResult<Tag> {
        let url = self.project(project_id, &["repository", "tags"])?;
        let body = TagRef {
            tag_name: name,
            reference,
        };
        self.send(Method::POST, url, &body).await
    }

    async fn create_file(&self, project_id: u64, file: &NewFile) -> RemoteResult<FileCommit> {
        let url = self.project(project_id, &["repository", "files", file.file_path.as_str()])?;
        self.send(Method::POST, url, file).await
    }

    async fn get_raw_file(&self, project_id: u64, path: &str, reference: &str) -> RemoteResult<String> {
        let mut url = self.project(project_id, &["repository", "files", path, "raw"])?;
        url.query_pairs_mut().append_pair("ref", reference);
        let res = Self::check(self.request(Method::GET, url)).await?;
        Ok(res.text().await?)
    }

    async fn create_project(&self, project: &NewProject) -> RemoteResult<Project> {
        let url = self.endpoint(&["projects"])?;
        self.send(Method::POST, url, project).await
    }

    async fn get_project(&self, project_id: u64) -> RemoteResult<Project> {
        let url = self.project(project_id, &[])?;
        self.get(url).await
    }

    async fn update_project(&self, project_id: u64, update: &ProjectUpdate) -> RemoteResult<Project> {
        let url = self.project(project_id, &[])?;
        self.send(Method::PUT, url, update).await
    }

    async fn delete_project(&self, project_id: u64) -> RemoteResult<()> {
        let url = self.project(project_id, &[])?;
        self.delete(url).await
    }

    async fn create_variable(&self, project_id: u64, variable: &NewVariable) -> RemoteResult<Variable> {
        let url = self.project(project_id, &["variables"])?;
        self.send(Method::POST, url, variable).await
    }

    async fn protect_branch(&self, project_id: u64, protect: &ProtectBranch) -> RemoteResult<ProtectedBranch> {
        let url = self.project(project_id, &["protected_branches"])?;
        self.send(Method::POST, url, protect).await
    }

    async fn get_protected_branch(&self, project_id: u64, name: &str) -> RemoteResult<ProtectedBranch> {
        let url = self.project(project_id, &["protected_branches", name])?;
        self.get(url).await
    }

    async fn list_protected_branches(&self, project_id: u64) -> RemoteResult<Vec<ProtectedBranch>> {
        let url = self.project(project_id, &["protected_branches"])?;
        self.get(url).await
    }

    async fn unprotect_branch(&self, project_id: u64, name: &str) -> RemoteResult<()> {
        let url = self.project(project_id, &["protected_branches", name])?;
        self.delete(url).await
    }

    async fn add_member(&self, project_id: u64, member: &NewMember) -> RemoteResult<Member> {
        let url = self.project(project_id, &["members"])?;
        self.send(Method::POST, url, member).await
    }

    async fn update_member(&self, project_id: u64, member: &NewMember) -> RemoteResult<Member> {
        let user = member.user_id.to_string();
        let url = self.project(project_id, &["members", user.as_str()])?;
        self.send(Method::PUT, url, member).await
    }

    async fn get_member(&self, project_id: u64, user_id: u64) -> RemoteResult<Member> {
        let user = user_id.to_string();
        let url = self.project(project_id, &["members", user.as_str()])?;
        self.get(url).await
    }

    async fn remove_member(&self, project_id: u64, user_id: u64) -> RemoteResult<()> {
        let user = user_id.to_string();
        let url = self.project(project_id, &["members", user.as_str()])?;
        self.delete(url).await
    }
}
