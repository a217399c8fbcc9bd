use std::fmt;
use std::fs::File;
use std::hash::Hash;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::to_writer_pretty;
use tracker_core_types::{Comment, CommentId, Project, ProjectId, Ticket, TicketId};

use crate::errors::StoreError;

/// A persisted record with a store-assigned numeric id.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static;

    const LABEL: &'static str;

    fn id(&self) -> Self::Id;

    fn set_id(&mut self, id: Self::Id);

    fn id_from_seq(seq: u64) -> Self::Id;

    fn seq_of(id: Self::Id) -> u64;
}

impl Entity for Project {
    type Id = ProjectId;
    const LABEL: &'static str = "project";

    fn id(&self) -> ProjectId {
        self.id
    }

    fn set_id(&mut self, id: ProjectId) {
        self.id = id;
    }

    fn id_from_seq(seq: u64) -> ProjectId {
        ProjectId(seq)
    }

    fn seq_of(id: ProjectId) -> u64 {
        id.0
    }
}

impl Entity for Ticket {
    type Id = TicketId;
    const LABEL: &'static str = "ticket";

    fn id(&self) -> TicketId {
        self.id
    }

    fn set_id(&mut self, id: TicketId) {
        self.id = id;
    }

    fn id_from_seq(seq: u64) -> TicketId {
        TicketId(seq)
    }

    fn seq_of(id: TicketId) -> u64 {
        id.0
    }
}

impl Entity for Comment {
    type Id = CommentId;
    const LABEL: &'static str = "comment";

    fn id(&self) -> CommentId {
        self.id
    }

    fn set_id(&mut self, id: CommentId) {
        self.id = id;
    }

    fn id_from_seq(seq: u64) -> CommentId {
        CommentId(seq)
    }

    fn seq_of(id: CommentId) -> u64 {
        id.0
    }
}

pub type Filter<'a, E> = &'a (dyn Fn(&E) -> bool + Send + Sync);

/// Generic data store contract. `find` returns entities with their owner
/// populated so authorization can inspect them.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn find(&self, id: E::Id) -> Result<Option<E>, StoreError>;

    /// Stores `entity` under a fresh id and returns the stored copy.
    async fn create(&self, entity: E) -> Result<E, StoreError>;

    async fn update(&self, entity: E) -> Result<E, StoreError>;

    async fn delete(&self, id: E::Id) -> Result<(), StoreError>;

    async fn list(&self, filter: Filter<'_, E>) -> Result<Vec<E>, StoreError>;
}

/// `DashMap` backed repository with sequential ids starting at 1.
pub struct InMemoryRepository<E: Entity> {
    entries: DashMap<E::Id, E>,
    next_seq: AtomicU64,
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(1),
        }
    }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries ordered by id.
    pub fn snapshot(&self) -> Vec<E> {
        let mut items: Vec<E> = self.entries.iter().map(|e| e.value().clone()).collect();
        items.sort_by_key(|item| item.id());
        items
    }
}

impl<E: Entity + Serialize> InMemoryRepository<E> {
    pub fn write_snapshot<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, &self.snapshot())
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn find(&self, id: E::Id) -> Result<Option<E>, StoreError> {
        Ok(self.entries.get(&id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, mut entity: E) -> Result<E, StoreError> {
        let id = E::id_from_seq(self.next_seq.fetch_add(1, Ordering::SeqCst));
        entity.set_id(id);
        self.entries.insert(id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, StoreError> {
        let id = entity.id();
        match self.entries.get_mut(&id) {
            Some(mut slot) => {
                *slot = entity.clone();
                Ok(entity)
            }
            None => Err(StoreError::not_found(E::LABEL, E::seq_of(id))),
        }
    }

    async fn delete(&self, id: E::Id) -> Result<(), StoreError> {
        self.entries
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(E::LABEL, E::seq_of(id)))
    }

    async fn list(&self, filter: Filter<'_, E>) -> Result<Vec<E>, StoreError> {
        let mut items: Vec<E> = self
            .entries
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by_key(|item| item.id());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::NamedTempFile;
    use tracker_core_types::UserId;

    fn ticket(project: u64, title: &str) -> Ticket {
        Ticket {
            id: TicketId(0),
            title: title.into(),
            short_description: String::new(),
            long_description: String::new(),
            status: Default::default(),
            priority: Default::default(),
            date: Utc::now(),
            project_id: ProjectId(project),
            owner_id: Some(UserId::from("u1")),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let repo = InMemoryRepository::<Ticket>::new();
        let first = repo.create(ticket(1, "a")).await.unwrap();
        let second = repo.create(ticket(1, "b")).await.unwrap();
        assert_eq!(first.id, TicketId(1));
        assert_eq!(second.id, TicketId(2));
        assert_eq!(
            repo.find(TicketId(2)).await.unwrap().unwrap().owner_id,
            Some(UserId::from("u1"))
        );
    }

    #[tokio::test]
    async fn list_applies_filter_in_id_order() {
        let repo = InMemoryRepository::<Ticket>::new();
        for (project, title) in [(1, "a"), (2, "b"), (1, "c")] {
            repo.create(ticket(project, title)).await.unwrap();
        }
        let titles: Vec<String> = repo
            .list(&|t: &Ticket| t.project_id == ProjectId(1))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["a".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn update_and_delete_require_existing_entry() {
        let repo = InMemoryRepository::<Ticket>::new();
        let mut missing = ticket(1, "ghost");
        missing.id = TicketId(42);
        assert!(matches!(
            repo.update(missing).await,
            Err(StoreError::NotFound { kind: "ticket", .. })
        ));
        assert!(repo.delete(TicketId(42)).await.is_err());

        let mut stored = repo.create(ticket(1, "real")).await.unwrap();
        stored.title = "renamed".into();
        repo.update(stored).await.unwrap();
        assert_eq!(repo.snapshot()[0].title, "renamed");
        repo.delete(TicketId(1)).await.unwrap();
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn snapshot_written_as_json() {
        let repo = InMemoryRepository::<Ticket>::new();
        repo.create(ticket(3, "persisted")).await.unwrap();
        let file = NamedTempFile::new().unwrap();
        repo.write_snapshot(file.path()).unwrap();
        let raw = std::fs::read_to_string(file.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed[0]["title"], "persisted");
        assert_eq!(parsed[0]["project_id"], 3);
    }
}
