//! Payloads of the team registration endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::{validate_not_blank, validate_team_name},
    state::game::Difficulty,
};

/// Team name and access code, shared by `/teams/register` and `/teams/validate`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamCredentials {
    #[validate(custom(function = "validate_team_name"))]
    pub team_name: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub access_code: String,
}

/// What an access code unlocks: a difficulty tier or the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    Easy,
    Medium,
    Hard,
    Admin,
}

impl From<Difficulty> for PlayMode {
    fn from(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => PlayMode::Easy,
            Difficulty::Medium => PlayMode::Medium,
            Difficulty::Hard => PlayMode::Hard,
        }
    }
}

/// Identifiers handed to the client after registration. Admin logins receive
/// the literal `"admin"` for both ids.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub team_id: String,
    pub session_id: String,
    pub difficulty: PlayMode,
}

/// Outcome of a dry-run validation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialCheckResponse {
    pub is_valid: bool,
    pub difficulty: PlayMode,
}
