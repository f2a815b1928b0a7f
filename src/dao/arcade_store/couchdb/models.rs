use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::state::game::Difficulty;

pub const TEAM_PREFIX: &str = "team::";
pub const TEAM_NAME_PREFIX: &str = "teamname::";
pub const SESSION_PREFIX: &str = "session::";
pub const QUESTION_PREFIX: &str = "question::";
pub const QUESTION_SLOT_PREFIX: &str = "questionslot::";
pub const RESPONSE_PREFIX: &str = "response::";
pub const ACTION_PREFIX: &str = "action::";
pub const TIMER_SETTINGS_DOC_ID: &str = "settings::timers";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Envelope adding CouchDB's `_id` / `_rev` to a stored body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> CouchDocument<T> {
    pub fn new(id: String, body: T) -> Self {
        Self {
            id,
            rev: None,
            body,
        }
    }
}

/// Claims a lower-cased team name for one team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamNameReservation {
    pub team_id: Uuid,
}

/// Claims a (difficulty, slot) pair for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSlotReservation {
    pub question_id: Uuid,
}

/// Minimal view used to read a document's revision.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

pub fn team_doc_id(id: Uuid) -> String {
    format!("{TEAM_PREFIX}{id}")
}

pub fn team_name_doc_id(name_key: &str) -> String {
    format!("{TEAM_NAME_PREFIX}{name_key}")
}

pub fn session_doc_id(session_id: &str) -> String {
    format!("{SESSION_PREFIX}{session_id}")
}

pub fn question_doc_id(id: Uuid) -> String {
    format!("{QUESTION_PREFIX}{id}")
}

pub fn question_slot_doc_id(difficulty: Difficulty, slot: u8) -> String {
    format!("{QUESTION_SLOT_PREFIX}{difficulty}::{slot}")
}

pub fn response_prefix(session_id: &str) -> String {
    format!("{RESPONSE_PREFIX}{session_id}::")
}

/// Zero-padded slot keeps responses of a session ordered by question.
pub fn response_doc_id(session_id: &str, question_id: u8) -> String {
    format!("{}{question_id:02}", response_prefix(session_id))
}

pub fn action_prefix(session_id: &str) -> String {
    format!("{ACTION_PREFIX}{session_id}::")
}

pub fn action_doc_id(session_id: &str, id: Uuid) -> String {
    format!("{}{id}", action_prefix(session_id))
}

/// Percent-encode characters that would otherwise break the document URL.
pub fn encode_doc_id(doc_id: &str) -> String {
    let mut encoded = String::with_capacity(doc_id.len());
    for c in doc_id.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            '/' => encoded.push_str("%2F"),
            '+' => encoded.push_str("%2B"),
            '?' => encoded.push_str("%3F"),
            '#' => encoded.push_str("%23"),
            ' ' => encoded.push_str("%20"),
            other => encoded.push(other),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_ids_sort_by_question() {
        let mut ids = vec![
            response_doc_id("s", 10),
            response_doc_id("s", 2),
            response_doc_id("s", 1),
        ];
        ids.sort();
        assert_eq!(ids, vec!["response::s::01", "response::s::02", "response::s::10"]);
    }

    #[test]
    fn doc_ids_are_url_safe() {
        assert_eq!(
            encode_doc_id("teamname::a/b c?#%"),
            "teamname::a%2Fb%20c%3F%23%25"
        );
    }

    #[test]
    fn document_envelope_flattens_body() {
        let doc = CouchDocument::new(
            team_name_doc_id("alpha"),
            TeamNameReservation {
                team_id: Uuid::nil(),
            },
        );
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["_id"], "teamname::alpha");
        assert!(json.get("_rev").is_none());
        assert_eq!(json["team_id"], Uuid::nil().to_string());
    }
}
