//! Team registration and credential checks.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, rng};
use tracing::{error, info};

use crate::{
    dao::models::{GameSessionEntity, TeamEntity},
    dto::team::{CredentialCheckResponse, PlayMode, RegistrationResponse, TeamCredentials},
    error::ServiceError,
    state::{SharedState, game::Difficulty},
};

/// Identifier returned in place of team and session ids for admin logins.
pub const ADMIN_PLACEHOLDER_ID: &str = "admin";

const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// What an access code grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGrant {
    Tier(Difficulty),
    Admin,
}

impl AccessGrant {
    fn mode(self) -> PlayMode {
        match self {
            AccessGrant::Tier(difficulty) => difficulty.into(),
            AccessGrant::Admin => PlayMode::Admin,
        }
    }
}

/// Map an access code to a difficulty tier or admin mode.
pub fn resolve_access_code(code: &str, admin_code: &str) -> Option<AccessGrant> {
    let code = code.trim();
    if code == admin_code {
        return Some(AccessGrant::Admin);
    }
    match code {
        "EASY123" => Some(AccessGrant::Tier(Difficulty::Easy)),
        "MED456" => Some(AccessGrant::Tier(Difficulty::Medium)),
        "HARD789" => Some(AccessGrant::Tier(Difficulty::Hard)),
        _ => None,
    }
}

/// Build a `<unix-millis>-<9 base36 chars>` session identifier.
pub fn generate_session_id(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let mut rng = rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect();
    format!("{millis}-{suffix}")
}

fn invalid_access_code() -> ServiceError {
    ServiceError::invalid_input("INVALID_ACCESS_CODE", "Invalid access code! Try again.")
}

fn team_exists() -> ServiceError {
    ServiceError::conflict(
        "TEAM_EXISTS",
        "This team name has already been used! Please choose a different team name.",
    )
}

/// Register a team and open its game session.
///
/// Duplicate names are refused before the access code is looked at, so a
/// taken name is reported even alongside the admin code.
pub async fn register(
    state: &SharedState,
    credentials: TeamCredentials,
) -> Result<RegistrationResponse, ServiceError> {
    let store = state.require_store().await?;
    let team_name = credentials.team_name.trim().to_owned();

    if store.find_team_by_name(team_name.clone()).await?.is_some() {
        return Err(team_exists());
    }

    let grant = resolve_access_code(&credentials.access_code, &state.config().admin_access_code)
        .ok_or_else(invalid_access_code)?;

    let difficulty = match grant {
        AccessGrant::Admin => {
            info!(team = %team_name, "admin access granted");
            return Ok(RegistrationResponse {
                team_id: ADMIN_PLACEHOLDER_ID.to_owned(),
                session_id: ADMIN_PLACEHOLDER_ID.to_owned(),
                difficulty: PlayMode::Admin,
            });
        }
        AccessGrant::Tier(difficulty) => difficulty,
    };

    let now = SystemTime::now();
    let team = TeamEntity::new(&team_name, credentials.access_code.trim(), difficulty, now);
    let team = store.insert_team(team).await.map_err(|err| {
        if err.is_conflict() {
            team_exists()
        } else {
            err.into()
        }
    })?;

    let session = GameSessionEntity::new(generate_session_id(now), team.id, difficulty, now);
    let session = match store.insert_session(session).await {
        Ok(session) => session,
        Err(err) => {
            error!(
                team_id = %team.id,
                error = %err,
                "team stored but its game session could not be created"
            );
            return Err(err.into());
        }
    };

    info!(
        team_id = %team.id,
        session_id = %session.session_id,
        %difficulty,
        "team registered"
    );

    Ok(RegistrationResponse {
        team_id: team.id.to_string(),
        session_id: session.session_id,
        difficulty: difficulty.into(),
    })
}

/// Check credentials without persisting anything.
pub async fn validate(
    state: &SharedState,
    credentials: TeamCredentials,
) -> Result<CredentialCheckResponse, ServiceError> {
    let grant = resolve_access_code(&credentials.access_code, &state.config().admin_access_code);
    if grant == Some(AccessGrant::Admin) {
        return Ok(CredentialCheckResponse {
            is_valid: true,
            difficulty: PlayMode::Admin,
        });
    }

    let store = state.require_store().await?;
    if store
        .find_team_by_name(credentials.team_name.trim().to_owned())
        .await?
        .is_some()
    {
        return Err(team_exists());
    }

    let grant = grant.ok_or_else(invalid_access_code)?;
    Ok(CredentialCheckResponse {
        is_valid: true,
        difficulty: grant.mode(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_codes_map_to_tiers() {
        let admin = "techteammode";
        assert_eq!(
            resolve_access_code("EASY123", admin),
            Some(AccessGrant::Tier(Difficulty::Easy))
        );
        assert_eq!(
            resolve_access_code("MED456", admin),
            Some(AccessGrant::Tier(Difficulty::Medium))
        );
        assert_eq!(
            resolve_access_code(" HARD789 ", admin),
            Some(AccessGrant::Tier(Difficulty::Hard))
        );
        assert_eq!(resolve_access_code(admin, admin), Some(AccessGrant::Admin));
        assert_eq!(resolve_access_code("easy123", admin), None);
        assert_eq!(resolve_access_code("", admin), None);
    }

    #[test]
    fn session_ids_have_millis_and_base36_suffix() {
        let now = UNIX_EPOCH + std::time::Duration::from_millis(1_700_000_000_123);
        let id = generate_session_id(now);
        let (millis, suffix) = id.split_once('-').unwrap();
        assert_eq!(millis, "1700000000123");
        assert_eq!(suffix.len(), SESSION_SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }
}
