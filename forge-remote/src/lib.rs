//! GitLab client used by forge-relay.
//!
//! [`GitlabApi`] is the set of GitLab operations the relay forwards to.
//! [`http::Http`] implements it over the GitLab REST API v4, and a
//! [`ClientFactory`] hands out one such client per impersonated user.

use async_trait::async_trait;

pub mod error;
pub mod factory;
pub mod http;
pub mod types;

pub use error::RemoteError;
pub use factory::{ClientFactory, SudoFactory};
pub use types::*;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Branch that new projects are created from.
pub const MASTER_BRANCH: &str = "master";
/// Branch created alongside every new project and made its default.
pub const DEVELOP_BRANCH: &str = "develop";
pub const README_PATH: &str = "README.md";

/// Operations forwarded to GitLab, as the user the client was created for.
#[async_trait]
pub trait GitlabApi: Send + Sync {
    async fn create_branch(&self, project_id: u64, name: &str, source: &str)
        -> RemoteResult<Branch>;
    async fn delete_branch(&self, project_id: u64, name: &str) -> RemoteResult<()>;
    async fn get_branch(&self, project_id: u64, name: &str) -> RemoteResult<Branch>;
    async fn list_branches(&self, project_id: u64) -> RemoteResult<Vec<Branch>>;

    async fn list_tags(&self, project_id: u64) -> RemoteResult<Vec<Tag>>;
    async fn list_tags_page(&self, project_id: u64, page: Page) -> RemoteResult<Vec<Tag>>;
    async fn create_tag(&self, project_id: u64, name: &str, reference: &str) -> RemoteResult<Tag>;

    async fn create_file(&self, project_id: u64, file: &NewFile) -> RemoteResult<FileCommit>;
    async fn get_raw_file(&self, project_id: u64, path: &str, reference: &str)
        -> RemoteResult<String>;

    async fn create_project(&self, project: &NewProject) -> RemoteResult<Project>;
    async fn get_project(&self, project_id: u64) -> RemoteResult<Project>;
    async fn update_project(&self, project_id: u64, update: &ProjectUpdate)
        -> RemoteResult<Project>;
    async fn delete_project(&self, project_id: u64) -> RemoteResult<()>;

    async fn create_variable(&self, project_id: u64, variable: &NewVariable)
        -> RemoteResult<Variable>;

    async fn protect_branch(&self, project_id: u64, protect: &ProtectBranch)
        -> RemoteResult<ProtectedBranch>;
    async fn get_protected_branch(&self, project_id: u64, name: &str)
        -> RemoteResult<ProtectedBranch>;
    async fn list_protected_branches(&self, project_id: u64) -> RemoteResult<Vec<ProtectedBranch>>;
    async fn unprotect_branch(&self, project_id: u64, name: &str) -> RemoteResult<()>;

    async fn add_member(&self, project_id: u64, member: &NewMember) -> RemoteResult<Member>;
    async fn update_member(&self, project_id: u64, member: &NewMember) -> RemoteResult<Member>;
    async fn get_member(&self, project_id: u64, user_id: u64) -> RemoteResult<Member>;
    async fn remove_member(&self, project_id: u64, user_id: u64) -> RemoteResult<()>;
}
