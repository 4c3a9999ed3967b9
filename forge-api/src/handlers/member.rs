use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use forge_remote::{Member, NewMember};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::UserQuery;
use crate::error::code;
use crate::server::AppState;
use crate::{ApiError, ApiResult};

/// Member to add or update, as sent by clients.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MemberVo {
    #[validate(required)]
    pub user_id: Option<u64>,
    #[validate(required, range(min = 0, max = 50))]
    pub access_level: Option<u32>,
    #[serde(default)]
    pub expires_at: Option<NaiveDate>,
}

impl TryFrom<MemberVo> for NewMember {
    type Error = ApiError;

    fn try_from(member: MemberVo) -> ApiResult<Self> {
        member.validate()?;
        match (member.user_id, member.access_level) {
            (Some(user_id), Some(access_level)) => Ok(NewMember {
                user_id,
                access_level,
                expires_at: member.expires_at,
            }),
            _ => Err(ApiError::invalid("userId and accessLevel are required")),
        }
    }
}

pub async fn add_member(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<UserQuery>,
    member: Result<Json<MemberVo>, JsonRejection>,
) -> ApiResult<Json<Member>> {
    let Json(member) = member?;
    let member = NewMember::try_from(member)?;
    info!(
        "Add member {} with access {} to project {} as user {:?}",
        member.user_id, member.access_level, project_id, params.user_id
    );
    let added = state
        .client(params.user_id, code::MEMBER_ADD)?
        .add_member(project_id, &member)
        .await
        .map_err(ApiError::common(code::MEMBER_ADD))?;
    Ok(Json(added))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(project_id): Path<u64>,
    Query(params): Query<UserQuery>,
    member: Result<Json<MemberVo>, JsonRejection>,
) -> ApiResult<Json<Member>> {
    let Json(member) = member?;
    let member = NewMember::try_from(member)?;
    info!(
        "Set member {} access to {} in project {} as user {:?}",
        member.user_id, member.access_level, project_id, params.user_id
    );
    let updated = state
        .client(params.user_id, code::MEMBER_UPDATE)?
        .update_member(project_id, &member)
        .await
        .map_err(ApiError::common(code::MEMBER_UPDATE))?;
    Ok(Json(updated))
}

pub async fn query_member(
    State(state): State<AppState>,
    Path((project_id, member_id)): Path<(u64, u64)>,
    Query(params): Query<UserQuery>,
) -> ApiResult<Json<Member>> {
    let member = state
        .client(params.user_id, code::MEMBER_QUERY)?
        .get_member(project_id, member_id)
        .await
        .map_err(ApiError::common(code::MEMBER_QUERY))?;
    Ok(Json(member))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((project_id, member_id)): Path<(u64, u64)>,
    Query(params): Query<UserQuery>,
) -> ApiResult<StatusCode> {
    info!(
        "Remove member {} from project {} as user {:?}",
        member_id, project_id, params.user_id
    );
    state
        .client(params.user_id, code::MEMBER_REMOVE)?
        .remove_member(project_id, member_id)
        .await
        .map_err(ApiError::common(code::MEMBER_REMOVE))?;
    Ok(StatusCode::NO_CONTENT)
}
