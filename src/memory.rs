//! In-memory repositories sharing one store, so task ownership can be checked
//! against registered users the same way the foreign key does in Postgres.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepository,
        repo_types::{NewUser, User},
    },
    error::{RepoError, RepoResult},
    tasks::{
        repo::TaskRepository,
        repo_types::{NewTask, Task},
    },
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    // keyed by id, so iteration is insertion order
    tasks: BTreeMap<i32, Task>,
    last_task_id: i32,
}

/// Shared backing store for [`InMemoryUserRepository`] and
/// [`InMemoryTaskRepository`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            store: self.clone(),
        }
    }

    pub fn tasks(&self) -> InMemoryTaskRepository {
        InMemoryTaskRepository {
            store: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    store: MemoryStore,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let state = self.store.state.read().await;
        Ok(state.users.values().any(|u| u.email == email))
    }

    async fn insert(&self, draft: NewUser) -> RepoResult<User> {
        let mut state = self.store.state.write().await;
        if state.users.values().any(|u| u.email == draft.email) {
            return Err(RepoError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: draft.id,
            name: draft.name,
            email: draft.email,
            password_hash: draft.password_hash,
            token_version: 0,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let state = self.store.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let state = self.store.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn bump_token_version(&self, id: Uuid) -> RepoResult<i32> {
        let mut state = self.store.state.write().await;
        let user = state.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.token_version += 1;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.token_version)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    store: MemoryStore,
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Task>> {
        let state = self.store.state.read().await;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.user_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_by_id_for_owner(
        &self,
        owner_id: Uuid,
        task_id: i32,
    ) -> RepoResult<Option<Task>> {
        let state = self.store.state.read().await;
        Ok(state
            .tasks
            .get(&task_id)
            .filter(|t| t.user_id == owner_id)
            .cloned())
    }

    async fn create(&self, task: NewTask) -> RepoResult<Task> {
        let mut state = self.store.state.write().await;
        if !state.users.contains_key(&task.user_id) {
            return Err(RepoError::UnknownOwner);
        }
        state.last_task_id += 1;
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: state.last_task_id,
            user_id: task.user_id,
            title: task.title,
            details: task.details,
            is_completed: task.is_completed,
            due_date: task.due_date,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update(&self, task: &Task) -> RepoResult<Task> {
        let mut state = self.store.state.write().await;
        let stored = state
            .tasks
            .get_mut(&task.id)
            .filter(|t| t.user_id == task.user_id)
            .ok_or(RepoError::NotFound)?;
        stored.title = task.title.clone();
        stored.details = task.details.clone();
        stored.is_completed = task.is_completed;
        stored.due_date = task.due_date;
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }

    async fn delete_for_owner(&self, owner_id: Uuid, task_id: i32) -> RepoResult<bool> {
        let mut state = self.store.state.write().await;
        let owned = state
            .tasks
            .get(&task_id)
            .is_some_and(|t| t.user_id == owner_id);
        if owned {
            state.tasks.remove(&task_id);
        }
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .users()
            .insert(NewUser::new("n".into(), email.into(), "hash".into()))
            .await
            .unwrap()
    }

    fn new_task(owner: Uuid, title: &str) -> NewTask {
        NewTask {
            user_id: owner,
            title: title.into(),
            details: None,
            is_completed: false,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let repo = store.users();
        assert!(!repo.exists_by_email("a@x.io").await.unwrap());
        let u = user(&store, "a@x.io").await;
        assert_eq!(u.token_version, 0);
        assert!(repo.exists_by_email("a@x.io").await.unwrap());

        let err = repo
            .insert(NewUser::new("m".into(), "a@x.io".into(), "h".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::DuplicateEmail));
    }

    #[tokio::test]
    async fn bump_token_version_increments() {
        let store = MemoryStore::new();
        let u = user(&store, "a@x.io").await;
        assert_eq!(store.users().bump_token_version(u.id).await.unwrap(), 1);
        assert_eq!(store.users().bump_token_version(u.id).await.unwrap(), 2);
        let fetched = store.users().get_by_id(u.id).await.unwrap().unwrap();
        assert_eq!(fetched.token_version, 2);
        assert!(matches!(
            store.users().bump_token_version(Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn create_requires_existing_owner() {
        let store = MemoryStore::new();
        let err = store
            .tasks()
            .create(new_task(Uuid::new_v4(), "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::UnknownOwner));
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let store = MemoryStore::new();
        let u = user(&store, "a@x.io").await;
        let draft = NewTask {
            details: Some("whole".into()),
            ..new_task(u.id, "buy milk")
        };
        let created = store.tasks().create(draft.clone()).await.unwrap();
        assert_eq!(created.id, 1);

        let got = store
            .tasks()
            .get_by_id_for_owner(u.id, created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, created);
        assert_eq!(got.title, draft.title);
        assert_eq!(got.details, draft.details);
    }

    #[tokio::test]
    async fn other_owner_cannot_see_update_or_delete() {
        let store = MemoryStore::new();
        let repo = store.tasks();
        let alice = user(&store, "a@x.io").await;
        let bob = user(&store, "b@x.io").await;
        let task = repo.create(new_task(alice.id, "private")).await.unwrap();

        assert!(repo
            .get_by_id_for_owner(bob.id, task.id)
            .await
            .unwrap()
            .is_none());

        let hijack = Task {
            user_id: bob.id,
            title: "mine now".into(),
            ..task.clone()
        };
        assert!(matches!(repo.update(&hijack).await, Err(RepoError::NotFound)));

        assert!(!repo.delete_for_owner(bob.id, task.id).await.unwrap());

        let still = repo
            .get_by_id_for_owner(alice.id, task.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(still.title, "private");
    }

    #[tokio::test]
    async fn list_is_scoped_and_ordered() {
        let store = MemoryStore::new();
        let repo = store.tasks();
        let alice = user(&store, "a@x.io").await;
        let bob = user(&store, "b@x.io").await;
        repo.create(new_task(alice.id, "one")).await.unwrap();
        repo.create(new_task(bob.id, "other")).await.unwrap();
        repo.create(new_task(alice.id, "two")).await.unwrap();

        let titles: Vec<_> = repo
            .list_by_owner(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["one", "two"]);
        assert!(repo.list_by_owner(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_twice_is_not_an_error() {
        let store = MemoryStore::new();
        let repo = store.tasks();
        let alice = user(&store, "a@x.io").await;
        let task = repo.create(new_task(alice.id, "gone")).await.unwrap();

        assert!(repo.delete_for_owner(alice.id, task.id).await.unwrap());
        assert!(!repo.delete_for_owner(alice.id, task.id).await.unwrap());
        assert!(repo
            .get_by_id_for_owner(alice.id, task.id)
            .await
            .unwrap()
            .is_none());
    }
}
