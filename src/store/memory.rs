use super::{PostStore, StoreError, sort_posts};
use crate::types::Post;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process post store.
///
/// Construct one at startup and hand out clones: every clone shares the same
/// map, and the contents live exactly as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    posts: Arc<RwLock<HashMap<String, Post>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored posts.
    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn save(&self, post: &Post) -> Result<(), StoreError> {
        let total = {
            let mut posts = self.posts.write().await;
            posts.insert(post.id.clone(), post.clone());
            posts.len()
        };
        tracing::debug!(id = %post.id, total, "post saved to memory store");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let post = self.posts.read().await.get(id).cloned();
        tracing::debug!(id, found = post.is_some(), "memory store lookup");
        Ok(post)
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self.posts.read().await.values().cloned().collect();
        sort_posts(&mut posts);
        Ok(posts)
    }

    async fn count(&self) -> Option<usize> {
        Some(self.len().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::sample_post;

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let store = MemoryStore::new();
        let post = sample_post("k3j9x0aa");

        store.save(&post).await.unwrap();
        assert_eq!(store.get("k3j9x0aa").await.unwrap(), Some(post));
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_overwrites_same_id() {
        let store = MemoryStore::new();
        store.save(&sample_post("same")).await.unwrap();

        let mut replacement = sample_post("same");
        replacement.output_text = "second".to_string();
        store.save(&replacement).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get("same").await.unwrap().unwrap().output_text,
            "second"
        );
    }

    #[tokio::test]
    async fn clones_share_contents() {
        let store = MemoryStore::new();
        let handle = store.clone();
        assert!(handle.is_empty().await);

        store.save(&sample_post("shared")).await.unwrap();
        assert!(handle.get("shared").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn count_tracks_saved_ids() {
        let store = MemoryStore::new();
        assert_eq!(store.count().await, Some(0));
        store.save(&sample_post("one")).await.unwrap();
        store.save(&sample_post("two")).await.unwrap();
        store.save(&sample_post("one")).await.unwrap();
        assert_eq!(store.count().await, Some(2));
    }

    #[tokio::test]
    async fn list_returns_posts_oldest_first() {
        let store = MemoryStore::new();
        let mut newer = sample_post("newer");
        newer.timestamp = 200;
        let mut older = sample_post("older");
        older.timestamp = 100;
        store.save(&newer).await.unwrap();
        store.save(&older).await.unwrap();

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, ["older", "newer"]);
    }
}
