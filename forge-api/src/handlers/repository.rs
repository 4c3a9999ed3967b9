//! `/v1/projects/:project_id/repository/...`: branches, tags and the README.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use forge_remote::{Branch, NewFile, Page, Tag, MASTER_BRANCH, README_PATH};
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};
use tracing::info;

use super::UserQuery;
use crate::error::code;
use crate::server::AppState;
use crate::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchQuery {
    pub name: String,
    pub source: String,
    pub user_id: u64,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBranchQuery {
    pub branch_name: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<u64>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsPageQuery {
    pub page: u32,
    pub per_page: u32,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<u64>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagQuery {
    pub name: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredUserQuery {
    pub user_id: u64,
}

pub async fn create_branch(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<CreateBranchQuery>,
) -> ApiResult<Json<Branch>> {
    info!(
        "Create branch {} from {} in project {} as user {}",
        params.name, params.source, project_id, params.user_id
    );
    let branch = state
        .client(Some(params.user_id), code::BRANCH_CREATE)?
        .create_branch(project_id, &params.name, &params.source)
        .await
        .map_err(ApiError::common(code::BRANCH_CREATE))?;
    Ok(Json(branch))
}

pub async fn delete_branch(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<DeleteBranchQuery>,
) -> ApiResult<StatusCode> {
    info!(
        "Delete branch {} in project {} as user {:?}",
        params.branch_name, project_id, params.user_id
    );
    state
        .client(params.user_id, code::BRANCH_DELETE)?
        .delete_branch(project_id, &params.branch_name)
        .await
        .map_err(ApiError::common(code::BRANCH_DELETE))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Looked up as the administrator.
pub async fn query_branch(
    State(state): State<AppState>,
    Path((project_id, branch_name)): Path<(u64, String)>,
) -> ApiResult<Json<Branch>> {
    let branch = state
        .client(None, code::BRANCH_QUERY)?
        .get_branch(project_id, &branch_name)
        .await
        .map_err(ApiError::common(code::BRANCH_QUERY))?;
    Ok(Json(branch))
}

pub async fn list_branches(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<UserQuery>,
) -> ApiResult<Json<Vec<Branch>>> {
    let branches = state
        .client(params.user_id, code::BRANCH_LIST)?
        .list_branches(project_id)
        .await
        .map_err(ApiError::common(code::BRANCH_LIST))?;
    Ok(Json(branches))
}

pub async fn list_tags(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<UserQuery>,
) -> ApiResult<Json<Vec<Tag>>> {
    let tags = state
        .client(params.user_id, code::TAG_GET)?
        .list_tags(project_id)
        .await
        .map_err(ApiError::common(code::TAG_GET))?;
    Ok(Json(tags))
}

pub async fn list_tags_page(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<TagsPageQuery>,
) -> ApiResult<Json<Vec<Tag>>> {
    let page = Page {
        page: params.page,
        per_page: params.per_page,
    };
    let tags = state
        .client(params.user_id, code::TAG_GET_PAGE)?
        .list_tags_page(project_id, page)
        .await
        .map_err(ApiError::common(code::TAG_GET_PAGE))?;
    Ok(Json(tags))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<CreateTagQuery>,
) -> ApiResult<Json<Tag>> {
    info!(
        "Create tag {} on {} in project {} as user {:?}",
        params.name, params.reference, project_id, params.user_id
    );
    let tag = state
        .client(params.user_id, code::TAG_CREATE)?
        .create_tag(project_id, &params.name, &params.reference)
        .await
        .map_err(ApiError::common(code::TAG_CREATE))?;
    Ok(Json(tag))
}

/// Commits the default README to master.
pub async fn create_readme(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<RequiredUserQuery>,
) -> ApiResult<Json<bool>> {
    info!(
        "Create README in project {} as user {}",
        project_id, params.user_id
    );
    state
        .client(Some(params.user_id), code::README_CREATE)?
        .create_file(project_id, &NewFile::readme())
        .await
        .map_err(ApiError::common(code::README_CREATE))?;
    Ok(Json(true))
}

pub async fn get_readme(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
) -> ApiResult<String> {
    state
        .client(None, code::README_GET)?
        .get_raw_file(project_id, README_PATH, MASTER_BRANCH)
        .await
        .map_err(ApiError::common(code::README_GET))
}
