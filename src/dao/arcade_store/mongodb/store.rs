use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        ACTIONS, MongoActionDocument, MongoQuestionDocument, MongoResponseDocument,
        MongoSessionDocument, MongoTeamDocument, MongoTimerSettingsDocument, QUESTIONS, RESPONSES,
        SESSIONS, SETTINGS, TEAMS, TIMER_SETTINGS_ID,
    },
};
use crate::{
    dao::{
        arcade_store::ArcadeStore,
        models::{
            BeforeSave, GameSessionEntity, MineActionEntity, QuizQuestionEntity,
            QuizResponseEntity, TeamEntity, TimerSettingsEntity,
        },
        storage::StorageResult,
    },
    state::game::Difficulty,
};

/// Indexes created on connect: (collection, keys, name, unique).
const INDEXES: &[(&str, &str, &str, bool)] = &[
    (TEAMS, "nameKey", "team_name_key_idx", true),
    (SESSIONS, "teamId", "session_team_idx", false),
    (QUESTIONS, "difficulty,questionId", "question_slot_idx", true),
    (RESPONSES, "sessionId,questionId", "response_slot_idx", true),
    (ACTIONS, "sessionId", "action_session_idx", false),
];

#[derive(Clone)]
pub struct MongoArcadeStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn compound_keys(keys: &str) -> Document {
    let mut document = Document::new();
    for key in keys.split(',') {
        document.insert(key, 1);
    }
    document
}

fn difficulty_filter(difficulty: Option<Difficulty>) -> Document {
    match difficulty {
        Some(difficulty) => doc! { "difficulty": difficulty.as_str() },
        None => doc! {},
    }
}

fn session_filter(session_id: Option<String>) -> Document {
    match session_id {
        Some(session_id) => doc! { "sessionId": session_id },
        None => doc! {},
    }
}

impl MongoArcadeStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        info!(
            database = %store.inner.config.database_name,
            "MongoDB store ready"
        );
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        for &(collection, keys, name, unique) in INDEXES {
            let index = IndexModel::builder()
                .keys(compound_keys(keys))
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: name,
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn find_many<T>(
        &self,
        collection: &'static str,
        filter: Document,
        sort: Document,
    ) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.collection::<T>(collection)
            .await
            .find(filter)
            .sort(sort)
            .await
            .map_err(|source| MongoDaoError::read(collection, source))?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::read(collection, source))
    }

    async fn find_one<T>(&self, collection: &'static str, filter: Document) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.collection::<T>(collection)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::read(collection, source))
    }

    async fn insert<T>(&self, collection: &'static str, document: &T) -> MongoResult<()>
    where
        T: Serialize + Send + Sync,
    {
        self.collection::<T>(collection)
            .await
            .insert_one(document)
            .await
            .map_err(|source| MongoDaoError::write(collection, source))?;
        Ok(())
    }

    /// Replace the document matching `filter`, inserting it when absent.
    async fn upsert<T>(&self, collection: &'static str, filter: Document, document: &T) -> MongoResult<u64>
    where
        T: Serialize + Send + Sync,
    {
        let result = self
            .collection::<T>(collection)
            .await
            .replace_one(filter, document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::write(collection, source))?;
        Ok(result.matched_count)
    }

    async fn insert_team(&self, mut team: TeamEntity) -> MongoResult<TeamEntity> {
        team.before_save(SystemTime::now());
        self.insert(TEAMS, &MongoTeamDocument::from(team.clone()))
            .await?;
        Ok(team)
    }

    async fn update_team(&self, mut team: TeamEntity) -> MongoResult<TeamEntity> {
        team.before_save(SystemTime::now());
        self.upsert(
            TEAMS,
            doc! { "_id": team.id.to_string() },
            &MongoTeamDocument::from(team.clone()),
        )
        .await?;
        Ok(team)
    }

    async fn find_team(&self, filter: Document) -> MongoResult<Option<TeamEntity>> {
        self.find_one::<MongoTeamDocument>(TEAMS, filter)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_teams(&self) -> MongoResult<Vec<TeamEntity>> {
        self.find_many::<MongoTeamDocument>(TEAMS, doc! {}, doc! { "createdAt": 1 })
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn insert_session(&self, mut session: GameSessionEntity) -> MongoResult<GameSessionEntity> {
        session.before_save(SystemTime::now());
        self.insert(SESSIONS, &MongoSessionDocument::from(session.clone()))
            .await?;
        Ok(session)
    }

    async fn save_session(&self, mut session: GameSessionEntity) -> MongoResult<GameSessionEntity> {
        session.before_save(SystemTime::now());
        self.upsert(
            SESSIONS,
            doc! { "_id": session.session_id.clone() },
            &MongoSessionDocument::from(session.clone()),
        )
        .await?;
        Ok(session)
    }

    async fn find_session(&self, session_id: String) -> MongoResult<Option<GameSessionEntity>> {
        self.find_one::<MongoSessionDocument>(SESSIONS, doc! { "_id": session_id })
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_sessions(&self) -> MongoResult<Vec<GameSessionEntity>> {
        self.find_many::<MongoSessionDocument>(SESSIONS, doc! {}, doc! { "startedAt": 1 })
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn list_questions(&self, difficulty: Option<Difficulty>) -> MongoResult<Vec<QuizQuestionEntity>> {
        self.find_many::<MongoQuestionDocument>(
            QUESTIONS,
            difficulty_filter(difficulty),
            doc! { "difficulty": 1, "questionId": 1 },
        )
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
    }

    async fn find_question(&self, id: Uuid) -> MongoResult<Option<QuizQuestionEntity>> {
        self.find_one::<MongoQuestionDocument>(QUESTIONS, doc! { "_id": id.to_string() })
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn insert_questions(
        &self,
        questions: Vec<QuizQuestionEntity>,
    ) -> MongoResult<Vec<QuizQuestionEntity>> {
        let now = SystemTime::now();
        let mut inserted = Vec::with_capacity(questions.len());
        for mut question in questions {
            question.before_save(now);
            self.insert(QUESTIONS, &MongoQuestionDocument::from(question.clone()))
                .await?;
            inserted.push(question);
        }
        Ok(inserted)
    }

    async fn update_question(
        &self,
        mut question: QuizQuestionEntity,
    ) -> MongoResult<Option<QuizQuestionEntity>> {
        let Some(existing) = self.find_question(question.id).await? else {
            return Ok(None);
        };
        question.created_at = existing.created_at;
        question.before_save(SystemTime::now());

        let result = self
            .collection::<MongoQuestionDocument>(QUESTIONS)
            .await
            .replace_one(
                doc! { "_id": question.id.to_string() },
                MongoQuestionDocument::from(question.clone()),
            )
            .await
            .map_err(|source| MongoDaoError::write(QUESTIONS, source))?;

        Ok((result.matched_count > 0).then_some(question))
    }

    async fn delete_question(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .collection::<Document>(QUESTIONS)
            .await
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|source| MongoDaoError::write(QUESTIONS, source))?;
        Ok(result.deleted_count > 0)
    }

    async fn find_response(
        &self,
        session_id: String,
        question_id: u8,
    ) -> MongoResult<Option<QuizResponseEntity>> {
        let found = self
            .find_one::<MongoResponseDocument>(
                RESPONSES,
                doc! { "sessionId": session_id, "questionId": i32::from(question_id) },
            )
            .await?;
        Ok(found.map(Into::into))
    }

    async fn save_response(&self, mut response: QuizResponseEntity) -> MongoResult<QuizResponseEntity> {
        response.before_save(SystemTime::now());
        self.upsert(
            RESPONSES,
            doc! {
                "sessionId": response.session_id.clone(),
                "questionId": i32::from(response.question_id),
            },
            &MongoResponseDocument::from(response.clone()),
        )
        .await?;
        Ok(response)
    }

    async fn list_responses(&self, session_id: Option<String>) -> MongoResult<Vec<QuizResponseEntity>> {
        let documents = self
            .find_many::<MongoResponseDocument>(
                RESPONSES,
                session_filter(session_id),
                doc! { "sessionId": 1, "questionId": 1 },
            )
            .await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert_action(&self, mut action: MineActionEntity) -> MongoResult<MineActionEntity> {
        action.before_save(SystemTime::now());
        self.insert(ACTIONS, &MongoActionDocument::from(action.clone()))
            .await?;
        Ok(action)
    }

    async fn list_actions(&self, session_id: Option<String>) -> MongoResult<Vec<MineActionEntity>> {
        self.find_many::<MongoActionDocument>(
            ACTIONS,
            session_filter(session_id),
            doc! { "actionAt": 1 },
        )
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
    }

    async fn load_timer_settings(&self) -> MongoResult<Option<TimerSettingsEntity>> {
        let found = self
            .find_one::<MongoTimerSettingsDocument>(SETTINGS, doc! { "_id": TIMER_SETTINGS_ID })
            .await?;
        Ok(found.map(Into::into))
    }

    async fn save_timer_settings(
        &self,
        mut settings: TimerSettingsEntity,
    ) -> MongoResult<TimerSettingsEntity> {
        settings.before_save(SystemTime::now());
        self.upsert(
            SETTINGS,
            doc! { "_id": TIMER_SETTINGS_ID },
            &MongoTimerSettingsDocument::from(settings),
        )
        .await?;
        Ok(settings)
    }
}

impl ArcadeStore for MongoArcadeStore {
    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_team(team).await.map_err(Into::into) })
    }

    fn update_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>> {
        let store = self.clone();
        Box::pin(async move { store.update_team(team).await.map_err(Into::into) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_team(doc! { "_id": id.to_string() })
                .await
                .map_err(Into::into)
        })
    }

    fn find_team_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_team(doc! { "nameKey": TeamEntity::name_key(&name) })
                .await
                .map_err(Into::into)
        })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams().await.map_err(Into::into) })
    }

    fn insert_session(
        &self,
        session: GameSessionEntity,
    ) -> BoxFuture<'static, StorageResult<GameSessionEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_session(session).await.map_err(Into::into) })
    }

    fn save_session(
        &self,
        session: GameSessionEntity,
    ) -> BoxFuture<'static, StorageResult<GameSessionEntity>> {
        let store = self.clone();
        Box::pin(async move { store.save_session(session).await.map_err(Into::into) })
    }

    fn find_session(
        &self,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_session(session_id).await.map_err(Into::into) })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_sessions().await.map_err(Into::into) })
    }

    fn list_questions(
        &self,
        difficulty: Option<Difficulty>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_questions(difficulty).await.map_err(Into::into) })
    }

    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuizQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_question(id).await.map_err(Into::into) })
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
                .find_response(session_id, question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_response(
        &self,
        response: QuizResponseEntity,
    ) -> BoxFuture<'static, StorageResult<QuizResponseEntity>> {
        let store = self.clone();
        Box::pin(async move { store.save_response(response).await.map_err(Into::into) })
    }

    fn list_responses(
        &self,
        session_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_responses(session_id).await.map_err(Into::into) })
    }

    fn insert_action(
        &self,
        action: MineActionEntity,
    ) -> BoxFuture<'static, StorageResult<MineActionEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_action(action).await.map_err(Into::into) })
    }

    fn list_actions(
        &self,
        session_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<MineActionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_actions(session_id).await.map_err(Into::into) })
    }

    fn load_timer_settings(&self) -> BoxFuture<'static, StorageResult<Option<TimerSettingsEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_timer_settings().await.map_err(Into::into) })
    }

    fn save_timer_settings(
        &self,
        settings: TimerSettingsEntity,
    ) -> BoxFuture<'static, StorageResult<TimerSettingsEntity>> {
        let store = self.clone();
        Box::pin(async move { store.save_timer_settings(settings).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
