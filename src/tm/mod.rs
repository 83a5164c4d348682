//! Teams Manager backend - wire types, auth and the HTTP client

pub mod auth;
mod client;
mod error;
mod types;

use async_trait::async_trait;

pub use client::{ApiRequest, ApiResponse, HttpTransport, TmClient, Transport};
pub use error::{AuthError, TmError};
pub use types::*;

/// Operations the migration needs from the Teams Manager backend
#[async_trait]
pub trait TmBackend: Send + Sync {
    async fn fetch_templates(&self) -> Result<Vec<Template>, TmError>;

    async fn fetch_managed_teams(&self) -> Result<Vec<SlimTeam>, TmError>;

    /// Every field defined in the tenant, across all templates
    async fn fetch_all_field_definitions(&self) -> Result<Vec<Field>, TmError>;

    async fn create_fields(&self, template_id: &str, fields: &[CreateField]) -> Result<(), TmError>;

    async fn convert_team(
        &self,
        template_id: &str,
        team_id: &str,
        team_title: &str,
        field_values: &[FieldValuePayload],
    ) -> Result<(), TmError>;

    async fn search_users(&self, query: &str) -> Result<Vec<User>, TmError>;
}
