//! Request handlers, one per endpoint. Each resolves the acting user to a
//! GitLab client and forwards its parameters to a single client call.

pub mod member;
pub mod project;
pub mod repository;

use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};

/// `?userId=` on endpoints where the acting user is optional. Without it the
/// call is made as the administrator.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<u64>,
}
