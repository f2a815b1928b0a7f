/// Storage backends for teams, sessions, questions and game logs.
pub mod arcade_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
