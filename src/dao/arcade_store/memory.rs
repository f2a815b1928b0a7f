//! Process-local store backed by concurrent maps. Used for local runs and tests.

use std::{sync::Arc, time::SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    dao::{
        arcade_store::{ArcadeStore, sort_questions},
        models::{
            BeforeSave, GameSessionEntity, MineActionEntity, QuizQuestionEntity,
            QuizResponseEntity, TeamEntity, TimerSettingsEntity,
        },
        storage::{StorageError, StorageResult},
    },
    state::game::Difficulty,
};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    teams: DashMap<Uuid, TeamEntity>,
    team_names: DashMap<String, Uuid>,
    sessions: DashMap<String, GameSessionEntity>,
    questions: DashMap<Uuid, QuizQuestionEntity>,
    question_slots: DashMap<(Difficulty, u8), Uuid>,
    responses: DashMap<(String, u8), QuizResponseEntity>,
    actions: RwLock<Vec<MineActionEntity>>,
    timers: RwLock<Option<TimerSettingsEntity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryInner {
    fn insert_team(&self, mut team: TeamEntity) -> StorageResult<TeamEntity> {
        team.before_save(SystemTime::now());
        match self.team_names.entry(team.name_key.clone()) {
            Entry::Occupied(_) => Err(StorageError::conflict(format!(
                "team name `{}` already exists",
                team.team_name
            ))),
            Entry::Vacant(slot) => {
                slot.insert(team.id);
                self.teams.insert(team.id, team.clone());
                Ok(team)
            }
        }
    }

    fn insert_question(&self, mut question: QuizQuestionEntity) -> StorageResult<QuizQuestionEntity> {
        question.before_save(SystemTime::now());
        match self
            .question_slots
            .entry((question.difficulty, question.question_id))
        {
            Entry::Occupied(_) => Err(slot_conflict(&question)),
            Entry::Vacant(slot) => {
                slot.insert(question.id);
                self.questions.insert(question.id, question.clone());
                Ok(question)
            }
        }
    }

    fn update_question(
        &self,
        mut question: QuizQuestionEntity,
    ) -> StorageResult<Option<QuizQuestionEntity>> {
        let Some(existing) = self.questions.get(&question.id).map(|q| q.clone()) else {
            return Ok(None);
        };

        let old_slot = (existing.difficulty, existing.question_id);
        let new_slot = (question.difficulty, question.question_id);
        if old_slot != new_slot {
            match self.question_slots.entry(new_slot) {
                Entry::Occupied(_) => return Err(slot_conflict(&question)),
                Entry::Vacant(slot) => {
                    slot.insert(question.id);
                }
            }
            self.question_slots.remove(&old_slot);
        }

        question.created_at = existing.created_at;
        question.before_save(SystemTime::now());
        self.questions.insert(question.id, question.clone());
        Ok(Some(question))
    }
}

fn slot_conflict(question: &QuizQuestionEntity) -> StorageError {
    StorageError::conflict(format!(
        "question {} already exists for {} difficulty",
        question.question_id, question.difficulty
    ))
}

impl ArcadeStore for MemoryStore {
    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>> {
        let store = self.clone();
        Box::pin(async move { store.inner.insert_team(team) })
    }

    fn update_team(&self, mut team: TeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>> {
        let store = self.clone();
        Box::pin(async move {
            team.before_save(SystemTime::now());
            store.inner.teams.insert(team.id, team.clone());
            Ok(team)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.teams.get(&id).map(|team| team.clone())) })
    }

    fn find_team_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let key = TeamEntity::name_key(&name);
            let id = store.inner.team_names.get(&key).map(|id| *id);
            Ok(id.and_then(|id| store.inner.teams.get(&id).map(|team| team.clone())))
        })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut teams: Vec<_> = store
                .inner
                .teams
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
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
            match store.inner.sessions.entry(session.session_id.clone()) {
                Entry::Occupied(_) => Err(StorageError::conflict(format!(
                    "session `{}` already exists",
                    session.session_id
                ))),
                Entry::Vacant(slot) => {
                    slot.insert(session.clone());
                    Ok(session)
                }
            }
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
                .inner
                .sessions
                .insert(session.session_id.clone(), session.clone());
            Ok(session)
        })
    }

    fn find_session(
        &self,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.sessions.get(&session_id).map(|s| s.clone())) })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut sessions: Vec<_> = store
                .inner
                .sessions
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
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
            let mut questions: Vec<_> = store
                .inner
                .questions
                .iter()
                .filter(|entry| difficulty.is_none_or(|d| entry.difficulty == d))
                .map(|entry| entry.value().clone())
                .collect();
            sort_questions(&mut questions);
            Ok(questions)
        })
    }

    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuizQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.questions.get(&id).map(|q| q.clone())) })
    }

    fn insert_questions(
        &self,
        questions: Vec<QuizQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            questions
                .into_iter()
                .map(|question| store.inner.insert_question(question))
                .collect()
        })
    }

    fn update_question(
        &self,
        question: QuizQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<Option<QuizQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.inner.update_question(question) })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.questions.remove(&id) {
                Some((_, question)) => {
                    store
                        .inner
                        .question_slots
                        .remove(&(question.difficulty, question.question_id));
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn find_response(
        &self,
        session_id: String,
        question_id: u8,
    ) -> BoxFuture<'static, StorageResult<Option<QuizResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .responses
                .get(&(session_id, question_id))
                .map(|r| r.clone()))
        })
    }

    fn save_response(
        &self,
        mut response: QuizResponseEntity,
    ) -> BoxFuture<'static, StorageResult<QuizResponseEntity>> {
        let store = self.clone();
        Box::pin(async move {
            response.before_save(SystemTime::now());
            store.inner.responses.insert(
                (response.session_id.clone(), response.question_id),
                response.clone(),
            );
            Ok(response)
        })
    }

    fn list_responses(
        &self,
        session_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut responses: Vec<_> = store
                .inner
                .responses
                .iter()
                .filter(|entry| {
                    session_id
                        .as_deref()
                        .is_none_or(|id| entry.session_id == id)
                })
                .map(|entry| entry.value().clone())
                .collect();
            responses.sort_by(|a, b| {
                (a.session_id.as_str(), a.question_id).cmp(&(b.session_id.as_str(), b.question_id))
            });
            Ok(responses)
        })
    }

    fn insert_action(
        &self,
        mut action: MineActionEntity,
    ) -> BoxFuture<'static, StorageResult<MineActionEntity>> {
        let store = self.clone();
        Box::pin(async move {
            action.before_save(SystemTime::now());
            store.inner.actions.write().await.push(action.clone());
            Ok(action)
        })
    }

    fn list_actions(
        &self,
        session_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<MineActionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let actions = store.inner.actions.read().await;
            Ok(actions
                .iter()
                .filter(|action| {
                    session_id
                        .as_deref()
                        .is_none_or(|id| action.session_id == id)
                })
                .cloned()
                .collect())
        })
    }

    fn load_timer_settings(&self) -> BoxFuture<'static, StorageResult<Option<TimerSettingsEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(*store.inner.timers.read().await) })
    }

    fn save_timer_settings(
        &self,
        mut settings: TimerSettingsEntity,
    ) -> BoxFuture<'static, StorageResult<TimerSettingsEntity>> {
        let store = self.clone();
        Box::pin(async move {
            settings.before_save(SystemTime::now());
            *store.inner.timers.write().await = Some(settings);
            Ok(settings)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{CellAction, CellType, RevealResult};

    fn question(difficulty: Difficulty, slot: u8) -> QuizQuestionEntity {
        let now = SystemTime::now();
        QuizQuestionEntity {
            id: Uuid::new_v4(),
            difficulty,
            question_id: slot,
            question: format!("Question {slot}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn team_names_are_unique_ignoring_case() {
        let store = MemoryStore::new();
        let now = SystemTime::now();
        store
            .insert_team(TeamEntity::new("Alpha", "EASY123", Difficulty::Easy, now))
            .await
            .unwrap();

        let err = store
            .insert_team(TeamEntity::new("ALPHA", "HARD789", Difficulty::Hard, now))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let found = store.find_team_by_name(" alpha ".into()).await.unwrap();
        assert_eq!(found.map(|t| t.team_name), Some("Alpha".to_owned()));
    }

    #[tokio::test]
    async fn question_slots_are_unique_and_move_on_update() {
        let store = MemoryStore::new();
        let first = question(Difficulty::Easy, 1);
        let second = question(Difficulty::Easy, 2);
        store
            .insert_questions(vec![first.clone(), second.clone()])
            .await
            .unwrap();

        let dup = store
            .insert_questions(vec![question(Difficulty::Easy, 1)])
            .await
            .unwrap_err();
        assert!(dup.is_conflict());

        let mut moved = first.clone();
        moved.question_id = 2;
        assert!(store.update_question(moved).await.unwrap_err().is_conflict());

        let mut moved = first.clone();
        moved.question_id = 3;
        assert!(store.update_question(moved).await.unwrap().is_some());
        store
            .insert_questions(vec![question(Difficulty::Easy, 1)])
            .await
            .unwrap();

        let listed = store.list_questions(Some(Difficulty::Easy)).await.unwrap();
        let slots: Vec<_> = listed.iter().map(|q| q.question_id).collect();
        assert_eq!(slots, vec![1, 2, 3]);

        assert!(store.delete_question(second.id).await.unwrap());
        assert!(!store.delete_question(second.id).await.unwrap());
    }

    #[tokio::test]
    async fn response_upsert_overwrites() {
        let store = MemoryStore::new();
        let response = QuizResponseEntity {
            session_id: "s1".into(),
            question_id: 3,
            question: "q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            selected_answer: 0,
            correct_answer: 2,
            is_correct: true,
            answered_at: SystemTime::now(),
        };
        let saved = store.save_response(response.clone()).await.unwrap();
        assert!(!saved.is_correct);

        let mut again = response;
        again.selected_answer = 2;
        store.save_response(again).await.unwrap();

        let all = store.list_responses(Some("s1".into())).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_correct);
    }

    #[tokio::test]
    async fn actions_keep_insertion_order_per_session() {
        let store = MemoryStore::new();
        for (session, cell_type) in [
            ("a", CellType::Mine),
            ("b", CellType::Blank),
            ("a", CellType::Pro),
        ] {
            store
                .insert_action(MineActionEntity {
                    id: Uuid::new_v4(),
                    session_id: session.into(),
                    cell_x: 0,
                    cell_y: 0,
                    cell_type,
                    action: CellAction::Reveal,
                    result: RevealResult::Miss,
                    action_at: SystemTime::now(),
                })
                .await
                .unwrap();
        }

        let results: Vec<_> = store
            .list_actions(Some("a".into()))
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.result)
            .collect();
        assert_eq!(results, vec![RevealResult::Hit, RevealResult::ProFound]);
        assert_eq!(store.list_actions(None).await.unwrap().len(), 3);
    }
}
