//! Project-level endpoints: creation, deletion, default branch, CI variables
//! and protected branches.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use forge_remote::{
    NewProject, NewVariable, Project, ProjectUpdate, ProtectBranch, ProtectedBranch, Variable,
    DEVELOP_BRANCH, MASTER_BRANCH,
};
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};
use tracing::{debug, info};

use super::UserQuery;
use crate::error::code;
use crate::server::AppState;
use crate::{ApiError, ApiResult};

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectQuery {
    pub group_id: u64,
    pub project_name: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<u64>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariableQuery {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub protecteds: bool,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<u64>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectBranchQuery {
    pub name: String,
    pub merge_access_level: String,
    pub push_access_level: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<u64>,
}

fn develop_as_default() -> ProjectUpdate {
    ProjectUpdate {
        default_branch: Some(DEVELOP_BRANCH.to_string()),
    }
}

/// Creates the project in the group, branches `develop` off `master` and
/// makes it the default branch. A failure at any step is reported as is; the
/// steps already done are not undone.
pub async fn create_project(
    State(state): State<AppState>,
    Query(params): Query<CreateProjectQuery>,
) -> ApiResult<Json<Project>> {
    info!(
        "Create project {} in group {} as user {:?}",
        params.project_name, params.group_id, params.user_id
    );
    let failed = || ApiError::common(code::PROJECT_CREATE);
    let client = state.client(params.user_id, code::PROJECT_CREATE)?;

    let project = client
        .create_project(&NewProject {
            namespace_id: params.group_id,
            name: params.project_name,
        })
        .await
        .map_err(failed())?;
    debug!("Created project {}", project.id);

    client
        .create_branch(project.id, DEVELOP_BRANCH, MASTER_BRANCH)
        .await
        .map_err(failed())?;

    let project = client
        .update_project(project.id, &develop_as_default())
        .await
        .map_err(failed())?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<UserQuery>,
) -> ApiResult<StatusCode> {
    info!("Delete project {} as user {:?}", project_id, params.user_id);
    state
        .client(params.user_id, code::PROJECT_DELETE)?
        .delete_project(project_id)
        .await
        .map_err(ApiError::common(code::PROJECT_DELETE))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resets the default branch to `develop`. The project is read as the
/// administrator and written as the acting user.
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<UserQuery>,
) -> ApiResult<Json<Project>> {
    let failed = || ApiError::common(code::PROJECT_UPDATE);

    let project = state
        .client(None, code::PROJECT_UPDATE)?
        .get_project(project_id)
        .await
        .map_err(failed())?;

    let project = state
        .client(params.user_id, code::PROJECT_UPDATE)?
        .update_project(project.id, &develop_as_default())
        .await
        .map_err(failed())?;
    Ok(Json(project))
}

pub async fn create_variable(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<CreateVariableQuery>,
) -> ApiResult<Json<Variable>> {
    info!(
        "Create variable {} in project {} as user {:?}",
        params.key, project_id, params.user_id
    );
    let variable = NewVariable {
        key: params.key,
        value: params.value,
        protected: params.protecteds,
    };
    let created = state
        .client(params.user_id, code::VARIABLE_CREATE)?
        .create_variable(project_id, &variable)
        .await
        .map_err(ApiError::common(code::VARIABLE_CREATE))?;
    Ok(Json(created))
}

pub async fn protect_branch(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<ProtectBranchQuery>,
) -> ApiResult<Json<ProtectedBranch>> {
    info!(
        "Protect branch {} in project {} (merge: {}, push: {}) as user {:?}",
        params.name,
        project_id,
        params.merge_access_level,
        params.push_access_level,
        params.user_id
    );
    let protect = ProtectBranch {
        name: params.name,
        merge_access_level: params.merge_access_level,
        push_access_level: params.push_access_level,
    };
    let protected = state
        .client(params.user_id, code::BRANCH_PROTECT)?
        .protect_branch(project_id, &protect)
        .await
        .map_err(ApiError::common(code::BRANCH_PROTECT))?;
    Ok(Json(protected))
}

pub async fn query_protected_branch(
    State(state): State<AppState>,
    Path((project_id, name)): Path<(u64, String)>,
    Query(params): Query<UserQuery>,
) -> ApiResult<Json<ProtectedBranch>> {
    let protected = state
        .client(params.user_id, code::PROTECTED_BRANCH_QUERY)?
        .get_protected_branch(project_id, &name)
        .await
        .map_err(ApiError::common(code::PROTECTED_BRANCH_QUERY))?;
    Ok(Json(protected))
}

pub async fn list_protected_branches(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<UserQuery>,
) -> ApiResult<Json<Vec<ProtectedBranch>>> {
    let protected = state
        .client(params.user_id, code::PROTECTED_BRANCH_LIST)?
        .list_protected_branches(project_id)
        .await
        .map_err(ApiError::common(code::PROTECTED_BRANCH_LIST))?;
    Ok(Json(protected))
}

pub async fn unprotect_branch(
    State(state): State<AppState>,
    Path((project_id, name)): Path<(u64, String)>,
    Query(params): Query<UserQuery>,
) -> ApiResult<StatusCode> {
    info!(
        "Unprotect branch {} in project {} as user {:?}",
        name, project_id, params.user_id
    );
    state
        .client(params.user_id, code::PROTECTED_BRANCH_DELETE)?
        .unprotect_branch(project_id, &name)
        .await
        .map_err(ApiError::common(code::PROTECTED_BRANCH_DELETE))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_are_unprotected_by_default() {
        let query: CreateVariableQuery =
            serde_json::from_str(r#"{"key": "K", "value": "V"}"#).unwrap();
        assert!(!query.protecteds);
    }

    #[test]
    fn test_develop_becomes_default() {
        assert_eq!(
            develop_as_default().default_branch.as_deref(),
            Some("develop")
        );
    }
}
