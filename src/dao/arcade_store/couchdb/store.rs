use std::{future::Future, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        arcade_store::{ArcadeStore, sort_questions},
        models::{
            BeforeSave, GameSessionEntity, MineActionEntity, QuizQuestionEntity,
            QuizResponseEntity, TeamEntity, TimerSettingsEntity,
        },
        storage::StorageResult,
    },
    state::game::Difficulty,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        ACTION_PREFIX, AllDocsResponse, CouchDocument, END_SUFFIX, QUESTION_PREFIX,
        QuestionSlotReservation, RESPONSE_PREFIX, RevisionOnly, SESSION_PREFIX, TEAM_PREFIX,
        TIMER_SETTINGS_DOC_ID, TeamNameReservation, action_doc_id, action_prefix, encode_doc_id,
        question_doc_id, question_slot_doc_id, response_doc_id, response_prefix, session_doc_id,
        team_doc_id, team_name_doc_id,
    },
};

/// [`ArcadeStore`] backed by a single CouchDB database. Entity kinds share the database and
/// are told apart by id prefix; unique constraints are held by reservation documents.
#[derive(Clone)]
pub struct CouchArcadeStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchArcadeStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        info!(database = %store.database, "CouchDB store ready");
        Ok(store)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authed(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authed(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412: another instance created it first.
                if create.status().is_success() || create.status() == StatusCode::PRECONDITION_FAILED {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, &encode_doc_id(doc_id))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn get_body<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        Ok(self
            .get_document::<CouchDocument<T>>(doc_id)
            .await?
            .map(|doc| doc.body))
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, &encode_doc_id(doc_id))
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                path: doc_id.to_string(),
            }),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    /// Create a document that must not exist yet.
    async fn create<T: Serialize>(&self, doc_id: String, body: &T) -> CouchResult<()> {
        let document = CouchDocument::new(doc_id, body);
        self.put_document(&document.id, &document).await
    }

    /// Write a document, replacing the current revision when present. A concurrent
    /// writer bumping the revision in between makes the write start over, so the last
    /// writer wins.
    async fn upsert<T: Serialize>(&self, doc_id: String, body: &T) -> CouchResult<()> {
        let document = CouchDocument::new(doc_id, body);
        let document = &document;
        retry_on_conflict(&document.id, UPSERT_ATTEMPTS, move || async move {
            let rev = self
                .get_document::<RevisionOnly>(&document.id)
                .await?
                .map(|existing| existing.rev);
            let current = CouchDocument {
                id: document.id.clone(),
                rev,
                body: document.body,
            };
            self.put_document(&current.id, &current).await
        })
        .await
    }

    async fn delete_document(&self, doc_id: &str) -> CouchResult<bool> {
        let Some(existing) = self.get_document::<RevisionOnly>(doc_id).await? else {
            return Ok(false);
        };

        let response = self
            .request(Method::DELETE, &encode_doc_id(doc_id))
            .query(&[("rev", existing.rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed: CouchDocument<T> =
                    from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                        path: ALL_DOCS.to_string(),
                        source,
                    })?;
                documents.push(parsed.body);
            }
        }

        Ok(documents)
    }

    async fn insert_team(&self, mut team: TeamEntity) -> CouchResult<TeamEntity> {
        team.before_save(SystemTime::now());
        let reservation = team_name_doc_id(&team.name_key);
        let reservation_id = reservation.as_str();
        self.create(reservation.clone(), &TeamNameReservation { team_id: team.id })
            .await?;
        release_on_failure(
            &reservation,
            self.create(team_doc_id(team.id), &team),
            move || self.delete_document(reservation_id),
        )
        .await?;
        Ok(team)
    }

    async fn find_team_by_name(&self, name: &str) -> CouchResult<Option<TeamEntity>> {
        let key = TeamEntity::name_key(name);
        let Some(reservation) = self
            .get_body::<TeamNameReservation>(&team_name_doc_id(&key))
            .await?
        else {
            return Ok(None);
        };
        self.get_body(&team_doc_id(reservation.team_id)).await
    }

    async fn insert_questions(
        &self,
        questions: Vec<QuizQuestionEntity>,
    ) -> CouchResult<Vec<QuizQuestionEntity>> {
        let now = SystemTime::now();
        let mut inserted = Vec::with_capacity(questions.len());
        for mut question in questions {
            question.before_save(now);
                let reservation = question_slot_doc_id(question.difficulty, question.question_id);
            let reservation_id = reservation.as_str();
            self.create(
                reservation.clone(),
                &QuestionSlotReservation {
                    question_id: question.id,
                },
            )
            .await?;
            release_on_failure(
                &reservation,
                self.create(question_doc_id(question.id), &question),
                move || self.delete_document(reservation_id),
            )
            .await?;
            inserted.push(question);
        }
        Ok(inserted)
    }

    async fn update_question(
        &self,
        mut question: QuizQuestionEntity,
    ) -> CouchResult<Option<QuizQuestionEntity>> {
        let Some(existing) = self
            .get_body::<QuizQuestionEntity>(&question_doc_id(question.id))
            .await?
        else {
            return Ok(None);
        };

        let old_slot = question_slot_doc_id(existing.difficulty, existing.question_id);
        let new_slot = question_slot_doc_id(question.difficulty, question.question_id);
        if old_slot != new_slot {
            self.create(
                new_slot,
                &QuestionSlotReservation {
                    question_id: question.id,
                },
            )
            .await?;
            if let Err(err) = self.delete_document(&old_slot).await {
                warn!(slot = %old_slot, error = %err, "failed to release question slot");
            }
        }

        question.created_at = existing.created_at;
        question.before_save(SystemTime::now());
        self.upsert(question_doc_id(question.id), &question).await?;
        Ok(Some(question))
    }

    async fn delete_question(&self, id: Uuid) -> CouchResult<bool> {
        let doc_id = question_doc_id(id);
        let Some(existing) = self.get_body::<QuizQuestionEntity>(&doc_id).await? else {
            return Ok(false);
        };
        let deleted = self.delete_document(&doc_id).await?;
        self.delete_document(&question_slot_doc_id(
            existing.difficulty,
            existing.question_id,
        ))
        .await?;
        Ok(deleted)
    }
}

/// Rev-fetch + PUT rounds tried before an upsert gives up under contention.
const UPSERT_ATTEMPTS: usize = 5;

/// Run `write` until it stops failing with a revision conflict.
async fn retry_on_conflict<F, Fut>(doc_id: &str, attempts: usize, mut write: F) -> CouchResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CouchResult<()>>,
{
    for attempt in 1..=attempts {
        match write().await {
            Err(CouchDaoError::Conflict { .. }) => {
                debug!(doc_id, attempt, "revision changed during upsert; retrying");
            }
            other => return other,
        }
    }
    Err(CouchDaoError::RevisionContention {
        path: doc_id.to_string(),
        attempts,
    })
}

/// Await `write`; when it fails, drop the reservation document that guarded it so the
/// reserved key becomes usable again. The write error is returned either way.
async fn release_on_failure<W, R, RFut>(reservation: &str, write: W, release: R) -> CouchResult<()>
where
    W: Future<Output = CouchResult<()>>,
    R: FnOnce() -> RFut,
    RFut: Future<Output = CouchResult<bool>>,
{
    let Err(err) = write.await else {
        return Ok(());
    };
    if let Err(cleanup) = release().await {
        warn!(
            reservation,
            error = %cleanup,
            "failed to release reservation after a failed write"
        );
    }
    Err(err)
}

impl ArcadeStore for CouchArcadeStore {
    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_team(team).await.map_err(Into::into) })
    }

    fn update_team(&self, mut team: TeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>> {
        let store = self.clone();
        Box::pin(async move {
            team.before_save(SystemTime::now());
            store.upsert(team_doc_id(team.id), &team).await?;
            Ok(team)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.get_body(&team_doc_id(id)).await.map_err(Into::into) })
    }

    fn find_team_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team_by_name(&name).await.map_err(Into::into) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut teams = store.list_documents::<TeamEntity>(TEAM_PREFIX).await?;
            teams.sort_by_key(|team| team.created_at);
            Ok(teams)
        })
    }

    fn insert_session(
        &self,
        mut session: GameSessionEntity,
    ) -> BoxFuture<'static, StorageResult<GameSessionEntity>> {
        let store = self.clone();
        Box::pin(async move {
            session.before_save(SystemTime::now());
            store
                .create(session_doc_id(&session.session_id), &session)
                .await?;
            Ok(session)
        })
    }

    fn save_session(
        &self,
        mut session: GameSessionEntity,
    ) -> BoxFuture<'static, StorageResult<GameSessionEntity>> {
        let store = self.clone();
        Box::pin(async move {
            session.before_save(SystemTime::now());
            store
                .upsert(session_doc_id(&session.session_id), &session)
                .await?;
            Ok(session)
        })
    }

    fn find_session(
        &self,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get_body(&session_doc_id(&session_id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut sessions = store
                .list_documents::<GameSessionEntity>(SESSION_PREFIX)
                .await?;
            sessions.sort_by_key(|session| session.started_at);
            Ok(sessions)
        })
    }

    fn list_questions(
        &self,
        difficulty: Option<Difficulty>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut questions = store
                .list_documents::<QuizQuestionEntity>(QUESTION_PREFIX)
                .await?;
            questions.retain(|q| difficulty.is_none_or(|d| q.difficulty == d));
            sort_questions(&mut questions);
            Ok(questions)
        })
    }

    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuizQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get_body(&question_doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn insert_questions(
        &self,
        questions: Vec<QuizQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.insert_questions(questions).await.map_err(Into::into) })
    }

    fn update_question(
        &self,
        question: QuizQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<Option<QuizQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.update_question(question).await.map_err(Into::into) })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_question(id).await.map_err(Into::into) })
    }

    fn find_response(
        &self,
        session_id: String,
        question_id: u8,
    ) -> BoxFuture<'static, StorageResult<Option<QuizResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get_body(&response_doc_id(&session_id, question_id))
                .await
                .map_err(Into::into)
        })
    }

    fn save_response(
        &self,
        mut response: QuizResponseEntity,
    ) -> BoxFuture<'static, StorageResult<QuizResponseEntity>> {
        let store = self.clone();
        Box::pin(async move {
            response.before_save(SystemTime::now());
            store
                .upsert(
                    response_doc_id(&response.session_id, response.question_id),
                    &response,
                )
                .await?;
            Ok(response)
        })
    }

    fn list_responses(
        &self,
        session_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let prefix = session_id
                .as_deref()
                .map(response_prefix)
                .unwrap_or_else(|| RESPONSE_PREFIX.to_owned());
            store.list_documents(&prefix).await.map_err(Into::into)
        })
    }

    fn insert_action(
        &self,
        mut action: MineActionEntity,
    ) -> BoxFuture<'static, StorageResult<MineActionEntity>> {
        let store = self.clone();
        Box::pin(async move {
            action.before_save(SystemTime::now());
            store
                .create(action_doc_id(&action.session_id, action.id), &action)
                .await?;
            Ok(action)
        })
    }

    fn list_actions(
        &self,
        session_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<MineActionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let prefix = session_id
                .as_deref()
                .map(action_prefix)
                .unwrap_or_else(|| ACTION_PREFIX.to_owned());
            let mut actions = store.list_documents::<MineActionEntity>(&prefix).await?;
            actions.sort_by_key(|action| action.action_at);
            Ok(actions)
        })
    }

    fn load_timer_settings(&self) -> BoxFuture<'static, StorageResult<Option<TimerSettingsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get_body(TIMER_SETTINGS_DOC_ID)
                .await
                .map_err(Into::into)
        })
    }

    fn save_timer_settings(
        &self,
        mut settings: TimerSettingsEntity,
    ) -> BoxFuture<'static, StorageResult<TimerSettingsEntity>> {
        let store = self.clone();
        Box::pin(async move {
            settings.before_save(SystemTime::now());
            store
                .upsert(TIMER_SETTINGS_DOC_ID.to_owned(), &settings)
                .await?;
            Ok(settings)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authed(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dao::storage::StorageError;

    fn conflict() -> CouchDaoError {
        CouchDaoError::Conflict {
            path: "response::s::01".into(),
        }
    }

    #[tokio::test]
    async fn upsert_retries_past_a_concurrent_revision() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let outcome = retry_on_conflict("response::s::01", UPSERT_ATTEMPTS, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok(())
            }
        })
        .await;

        assert!(outcome.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn upsert_contention_is_not_reported_as_a_duplicate() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let outcome = retry_on_conflict("response::s::01", 3, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = outcome.unwrap_err();
        assert!(matches!(
            err,
            CouchDaoError::RevisionContention { attempts: 3, .. }
        ));
        assert!(!StorageError::from(err).is_conflict());
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let outcome = retry_on_conflict("session::s", UPSERT_ATTEMPTS, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CouchDaoError::RequestStatus {
                path: "session::s".into(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            })
        })
        .await;

        assert!(matches!(outcome, Err(CouchDaoError::RequestStatus { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_team_write_releases_the_name_reservation() {
        let counter = AtomicUsize::new(0);
        let released = &counter;
        let outcome = release_on_failure(
            "teamname::alpha",
            async {
                Err(CouchDaoError::RequestStatus {
                    path: "team::1".into(),
                    status: StatusCode::SERVICE_UNAVAILABLE,
                })
            },
            move || async move {
                released.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            },
        )
        .await;

        assert!(matches!(
            outcome,
            Err(CouchDaoError::RequestStatus {
                status: StatusCode::SERVICE_UNAVAILABLE,
                ..
            })
        ));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn successful_write_keeps_the_reservation() {
        let counter = AtomicUsize::new(0);
        let released = &counter;
        let outcome = release_on_failure("teamname::alpha", async { Ok(()) }, move || async move {
            released.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        })
        .await;

        assert!(outcome.is_ok());
        assert_eq!(released.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_release_still_reports_the_write_error() {
        let outcome = release_on_failure(
            "questionslot::easy::1",
            async { Err(conflict()) },
            || async {
                Err(CouchDaoError::RequestStatus {
                    path: "questionslot::easy::1".into(),
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                })
            },
        )
        .await;

        assert!(matches!(outcome, Err(CouchDaoError::Conflict { .. })));
    }
}
