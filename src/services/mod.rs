/// Admin question bank, timers and team lookups.
pub mod admin_service;
/// Leaderboard and analytics reports.
pub mod analytics_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Mine game scoring.
pub mod mine_service;
/// Built-in default questions and generator templates.
pub mod question_bank;
/// Quiz round flow.
pub mod quiz_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Team registration.
pub mod team_service;
