pub mod attendance;
pub mod auth;
pub mod courses;
pub mod health;
pub mod leaves;
pub mod organizations;
pub mod pages;
pub mod results;
pub mod staff;
pub mod students;

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

/// Optional tenant filter. Only the super admin may point it at another organization.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScopeQuery {
    pub organization_id: Option<Uuid>,
}
