//! Recording GitLab client and request helpers shared by the endpoint tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use forge_api::ApiServer;
use forge_remote::*;

/// One forwarded call: who made it and what was asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub user: Option<u64>,
    pub op: String,
}

impl Call {
    pub fn new(user: Option<u64>, op: impl Into<String>) -> Self {
        Self {
            user,
            op: op.into(),
        }
    }
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<&'static str>>,
}

/// Factory handing out [`MockGitlab`] clients that all record into one log.
#[derive(Clone, Default)]
pub struct MockFactory {
    recorder: Arc<Recorder>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to the named operation fail.
    pub fn fail(&self, op: &'static str) {
        self.recorder.failing.lock().unwrap().insert(op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.recorder.calls.lock().unwrap().clone()
    }

    pub fn app(&self) -> Router {
        ApiServer::with_factory(Arc::new(self.clone())).router()
    }
}

impl ClientFactory for MockFactory {
    fn client(&self, user_id: Option<u64>) -> RemoteResult<Arc<dyn GitlabApi>> {
        Ok(Arc::new(MockGitlab {
            user: user_id,
            recorder: self.recorder.clone(),
        }))
    }
}

pub struct MockGitlab {
    user: Option<u64>,
    recorder: Arc<Recorder>,
}

impl MockGitlab {
    fn record(&self, name: &'static str, args: String) -> RemoteResult<()> {
        self.recorder
            .calls
            .lock()
            .unwrap()
            .push(Call::new(self.user, format!("{}({})", name, args)));
        if self.recorder.failing.lock().unwrap().contains(name) {
            return Err(RemoteError::Status {
                status: 500,
                message: format!("{} failed", name),
            });
        }
        Ok(())
    }
}

fn extra(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn branch(name: &str) -> Branch {
    Branch {
        name: name.to_string(),
        protected: false,
        default: false,
        commit: None,
        extra: extra(json!({"web_url": format!("http://gitlab/-/tree/{}", name)})),
    }
}

pub fn tag(name: &str) -> Tag {
    Tag {
        name: name.to_string(),
        message: None,
        target: Some("abc123".to_string()),
        commit: None,
        protected: false,
        extra: Map::new(),
    }
}

pub fn project(id: u64, name: &str, default_branch: Option<&str>) -> Project {
    Project {
        id,
        name: name.to_string(),
        path_with_namespace: Some(format!("group/{}", name)),
        default_branch: default_branch.map(str::to_string),
        extra: Map::new(),
    }
}

pub fn protected_branch(name: &str) -> ProtectedBranch {
    ProtectedBranch {
        id: Some(1),
        name: name.to_string(),
        push_access_levels: vec![],
        merge_access_levels: vec![],
        extra: Map::new(),
    }
}

pub fn member(user_id: u64, access_level: u32) -> Member {
    Member {
        id: user_id,
        username: Some(format!("user{}", user_id)),
        name: None,
        access_level,
        expires_at: None,
        extra: Map::new(),
    }
}

#[async_trait]
impl GitlabApi for MockGitlab {
    async fn create_branch(&self, project_id: u64, name: &str, source: &str) -> RemoteResult<Branch> {
        self.record("create_branch", format!("{}, {}, {}", project_id, name, source))?;
        Ok(branch(name))
    }

    async fn delete_branch(&self, project_id: u64, name: &str) -> RemoteResult<()> {
        self.record("delete_branch", format!("{}, {}", project_id, name))
    }

    async fn get_branch(&self, project_id: u64, name: &str) -> RemoteResult<Branch> {
        self.record("get_branch", format!("{}, {}", project_id, name))?;
        Ok(branch(name))
    }

    async fn list_branches(&self, project_id: u64) -> RemoteResult<Vec<Branch>> {
        self.record("list_branches", project_id.to_string())?;
        Ok(vec![branch("master"), branch("develop")])
    }

    async fn list_tags(&self, project_id: u64) -> RemoteResult<Vec<Tag>> {
        self.record("list_tags", project_id.to_string())?;
        Ok(vec![tag("v1"), tag("v2")])
    }

    async fn list_tags_page(&self, project_id: u64, page: Page) -> RemoteResult<Vec<Tag>> {
        self.record(
            "list_tags_page",
            format!("{}, {}, {}", project_id, page.page, page.per_page),
        )?;
        Ok(vec![tag("v3")])
    }

    async fn create_tag(&self, project_id: u64, name: &str, reference: &str) -> RemoteResult<Tag> {
        self.record("create_tag", format!("{}, {}, {}", project_id, name, reference))?;
        Ok(tag(name))
    }

    async fn create_file(&self, project_id: u64, file: &NewFile) -> RemoteResult<FileCommit> {
        self.record(
            "create_file",
            format!("{}, {}, {}", project_id, file.file_path, file.branch),
        )?;
        Ok(FileCommit {
            file_path: file.file_path.clone(),
            branch: file.branch.clone(),
        })
    }

    async fn get_raw_file(&self, project_id: u64, path: &str, reference: &str) -> RemoteResult<String> {
        self.record("get_raw_file", format!("{}, {}, {}", project_id, path, reference))?;
        Ok("# README\n".to_string())
    }

    async fn create_project(&self, new: &NewProject) -> RemoteResult<Project> {
        self.record("create_project", format!("{}, {}", new.namespace_id, new.name))?;
        Ok(project(100, &new.name, None))
    }

    async fn get_project(&self, project_id: u64) -> RemoteResult<Project> {
        self.record("get_project", project_id.to_string())?;
        Ok(project(project_id, "existing", Some("master")))
    }

    async fn update_project(&self, project_id: u64, update: &ProjectUpdate) -> RemoteResult<Project> {
        self.record(
            "update_project",
            format!("{}, {:?}", project_id, update.default_branch),
        )?;
        Ok(project(project_id, "updated", update.default_branch.as_deref()))
    }

    async fn delete_project(&self, project_id: u64) -> RemoteResult<()> {
        self.record("delete_project", project_id.to_string())
    }

    async fn create_variable(&self, project_id: u64, variable: &NewVariable) -> RemoteResult<Variable> {
        self.record(
            "create_variable",
            format!(
                "{}, {}, {}, {}",
                project_id, variable.key, variable.value, variable.protected
            ),
        )?;
        Ok(Variable {
            key: variable.key.clone(),
            value: variable.value.clone(),
            protected: variable.protected,
            extra: Map::new(),
        })
    }

    async fn protect_branch(&self, project_id: u64, protect: &ProtectBranch) -> RemoteResult<ProtectedBranch> {
        self.record(
            "protect_branch",
            format!(
                "{}, {}, {}, {}",
                project_id, protect.name, protect.merge_access_level, protect.push_access_level
            ),
        )?;
        Ok(protected_branch(&protect.name))
    }

    async fn get_protected_branch(&self, project_id: u64, name: &str) -> RemoteResult<ProtectedBranch> {
        self.record("get_protected_branch", format!("{}, {}", project_id, name))?;
        Ok(protected_branch(name))
    }

    async fn list_protected_branches(&self, project_id: u64) -> RemoteResult<Vec<ProtectedBranch>> {
        self.record("list_protected_branches", project_id.to_string())?;
        Ok(vec![protected_branch("master")])
    }

    async fn unprotect_branch(&self, project_id: u64, name: &str) -> RemoteResult<()> {
        self.record("unprotect_branch", format!("{}, {}", project_id, name))
    }

    async fn add_member(&self, project_id: u64, new: &NewMember) -> RemoteResult<Member> {
        self.record(
            "add_member",
            format!("{}, {}, {}, {:?}", project_id, new.user_id, new.access_level, new.expires_at),
        )?;
        Ok(member(new.user_id, new.access_level))
    }

    async fn update_member(&self, project_id: u64, new: &NewMember) -> RemoteResult<Member> {
        self.record(
            "update_member",
            format!("{}, {}, {}, {:?}", project_id, new.user_id, new.access_level, new.expires_at),
        )?;
        Ok(member(new.user_id, new.access_level))
    }

    async fn get_member(&self, project_id: u64, user_id: u64) -> RemoteResult<Member> {
        self.record("get_member", format!("{}, {}", project_id, user_id))?;
        Ok(member(user_id, 30))
    }

    async fn remove_member(&self, project_id: u64, user_id: u64) -> RemoteResult<()> {
        self.record("remove_member", format!("{}, {}", project_id, user_id))
    }
}

/// Response status plus body, parsed as JSON when it is JSON.
pub struct Reply {
    pub status: StatusCode,
    pub text: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    Reply {
        status,
        text: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}
