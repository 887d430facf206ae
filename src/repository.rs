//! In-memory repository.
//!
//! Every operation returns a future and runs on the [`BlockingPool`], the way
//! a real store's blocking driver calls would. Failures are plain
//! `anyhow::Error`s, so a handler that propagates them with `?` ends up on the
//! generic 500 path.

use crate::pagination::{Direction, Page, Pageable};
use crate::worker_pool::BlockingPool;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::debug;

/// A storable record with a numeric identity.
pub trait Entity: Serialize + Clone + Send + Sync + 'static {
    fn id(&self) -> Option<u64>;
    fn with_id(self, id: u64) -> Self;
}

/// Store keyed by id, kept in id order.
pub struct MemoryRepository<T> {
    rows: Arc<RwLock<BTreeMap<u64, T>>>,
    next_id: Arc<AtomicU64>,
    pool: BlockingPool,
}

impl<T> Clone for MemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            next_id: Arc::clone(&self.next_id),
            pool: self.pool.clone(),
        }
    }
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new(pool: BlockingPool) -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            pool,
        }
    }

    pub async fn find_all(&self) -> anyhow::Result<Vec<T>> {
        let rows = Arc::clone(&self.rows);
        self.pool
            .run(move || Ok(rows.read().values().cloned().collect()))
            .await
    }

    /// Entities accepted by `filter`, in id order.
    pub async fn find_where<F>(&self, filter: F) -> anyhow::Result<Vec<T>>
    where
        F: Fn(&T) -> bool + Send + 'static,
    {
        let rows = Arc::clone(&self.rows);
        self.pool
            .run(move || Ok(rows.read().values().filter(|t| filter(t)).cloned().collect()))
            .await
    }

    /// One page, sorted by the pageable's order when it has one.
    pub async fn find_page(&self, pageable: &Pageable) -> anyhow::Result<Page<T>> {
        let rows = Arc::clone(&self.rows);
        let pageable = pageable.clone().defaults();
        self.pool
            .run(move || {
                let mut all: Vec<T> = rows.read().values().cloned().collect();
                let total = all.len() as u64;
                if let Some(sort) = pageable.to_query_order() {
                    let pointer = format!("/{}", sort.field.replace('.', "/"));
                    let mut keyed = all
                        .into_iter()
                        .map(|t| -> anyhow::Result<(Value, T)> {
                            let key = serde_json::to_value(&t)?
                                .pointer(&pointer)
                                .cloned()
                                .unwrap_or(Value::Null);
                            Ok((key, t))
                        })
                        .collect::<anyhow::Result<Vec<(Value, T)>>>()?;
                    keyed.sort_by(|(a, _), (b, _)| {
                        let ord = compare_values(a, b);
                        match sort.direction {
                            Direction::Asc => ord,
                            Direction::Desc => ord.reverse(),
                        }
                    });
                    all = keyed.into_iter().map(|(_, t)| t).collect();
                }
                let offset = usize::try_from(pageable.offset()).unwrap_or(usize::MAX);
                let content: Vec<T> = all
                    .into_iter()
                    .skip(offset)
                    .take(pageable.size() as usize)
                    .collect();
                debug!(
                    page = pageable.page(),
                    size = pageable.size(),
                    returned = content.len(),
                    total,
                    "Page query"
                );
                Ok(Page::new(&pageable, content, total))
            })
            .await
    }

    pub async fn find_one(&self, id: u64) -> anyhow::Result<Option<T>> {
        let rows = Arc::clone(&self.rows);
        self.pool.run(move || Ok(rows.read().get(&id).cloned())).await
    }

    /// Insert or replace. Entities without an id get the next free one.
    pub async fn save(&self, entity: T) -> anyhow::Result<T> {
        let rows = Arc::clone(&self.rows);
        let next_id = Arc::clone(&self.next_id);
        self.pool
            .run(move || Ok(store(&rows, &next_id, entity)))
            .await
    }

    pub async fn save_all(&self, entities: Vec<T>) -> anyhow::Result<Vec<T>> {
        let rows = Arc::clone(&self.rows);
        let next_id = Arc::clone(&self.next_id);
        self.pool
            .run(move || {
                Ok(entities
                    .into_iter()
                    .map(|e| store(&rows, &next_id, e))
                    .collect())
            })
            .await
    }

    /// Returns whether an entity was removed.
    pub async fn delete(&self, id: u64) -> anyhow::Result<bool> {
        let rows = Arc::clone(&self.rows);
        self.pool.run(move || Ok(rows.write().remove(&id).is_some())).await
    }

    pub async fn count(&self) -> anyhow::Result<u64> {
        let rows = Arc::clone(&self.rows);
        self.pool.run(move || Ok(rows.read().len() as u64)).await
    }
}

fn store<T: Entity>(rows: &RwLock<BTreeMap<u64, T>>, next_id: &AtomicU64, entity: T) -> T {
    let entity = match entity.id() {
        Some(id) => {
            next_id.fetch_max(id.saturating_add(1), AtomicOrdering::SeqCst);
            entity
        }
        None => {
            let id = next_id.fetch_add(1, AtomicOrdering::SeqCst);
            entity.with_id(id)
        }
    };
    if let Some(id) = entity.id() {
        rows.write().insert(id, entity.clone());
    }
    entity
}

/// Total order over JSON scalars: null < bool < number < string < other.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: Option<u64>,
        name: String,
    }

    impl Entity for Row {
        fn id(&self) -> Option<u64> {
            self.id
        }

        fn with_id(mut self, id: u64) -> Self {
            self.id = Some(id);
            self
        }
    }

    fn row(name: &str) -> Row {
        Row {
            id: None,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_assigns_ids() {
        let repo = MemoryRepository::new(BlockingPool::default());
        let a = repo.save(row("a")).await.unwrap();
        let b = repo.save(row("b")).await.unwrap();
        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        let explicit = repo
            .save(Row {
                id: Some(10),
                name: "x".into(),
            })
            .await
            .unwrap();
        assert_eq!(explicit.id, Some(10));
        assert_eq!(repo.save(row("c")).await.unwrap().id, Some(11));
        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_find_page_sorts_and_slices() {
        let repo = MemoryRepository::new(BlockingPool::default());
        repo.save_all(vec![row("carol"), row("alice"), row("bob")])
            .await
            .unwrap();

        let page = repo
            .find_page(&Pageable::of(0, 2).with_order("name,asc"))
            .await
            .unwrap();
        let names: Vec<&str> = page.content.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(page.total_elements, 3);

        let page = repo
            .find_page(&Pageable::of(1, 2).with_order("name,desc"))
            .await
            .unwrap();
        let names: Vec<&str> = page.content.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alice"]);

        let unordered = repo.find_page(&Pageable::default()).await.unwrap();
        let names: Vec<&str> = unordered.content.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["carol", "alice", "bob"]);
    }

    #[tokio::test]
    async fn test_save_with_max_id_does_not_overflow() {
        let repo = MemoryRepository::new(BlockingPool::default());
        let max = repo
            .save(Row {
                id: Some(u64::MAX),
                name: "last".into(),
            })
            .await
            .unwrap();
        assert_eq!(max.id, Some(u64::MAX));
        assert_eq!(repo.find_one(u64::MAX).await.unwrap(), Some(max));
    }

    #[tokio::test]
    async fn test_delete_and_find_one() {
        let repo = MemoryRepository::new(BlockingPool::default());
        let saved = repo.save(row("a")).await.unwrap();
        let id = saved.id.unwrap();
        assert_eq!(repo.find_one(id).await.unwrap(), Some(saved));
        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
        assert_eq!(repo.find_one(id).await.unwrap(), None);
    }
}
