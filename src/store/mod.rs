//! Post store gateway: keyed persistence of [`Post`] records.
//!
//! Two interchangeable implementations sit behind [`PostStore`]:
//!
//! | Store | Backing | Lifetime |
//! |---|---|---|
//! | [`MemoryStore`] | `HashMap` behind an async `RwLock` | the hosting process |
//! | [`HttpStore`] | remote service (`/api/posts`) over `reqwest` | managed by the remote side |
//!
//! A missing id is a normal outcome (`Ok(None)`), never an error: callers
//! distinguish "never created" from "failed to load". Saving under an
//! existing id overwrites the previous record.

mod http;
mod memory;

pub use http::{HttpStore, SaveReceipt};
pub use memory::MemoryStore;

use crate::types::Post;
use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode store response: {0}")]
    Decode(String),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Keyed storage of posts.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Persist `post` under `post.id`, replacing any previous record.
    async fn save(&self, post: &Post) -> Result<(), StoreError>;

    /// Load the record stored at `id`; `None` when it was never saved.
    async fn get(&self, id: &str) -> Result<Option<Post>, StoreError>;

    /// All stored records, oldest first.
    async fn list(&self) -> Result<Vec<Post>, StoreError>;

    /// Number of stored records, when the store can tell without loading
    /// them. Remote stores only promise save and get, so the default is `None`.
    async fn count(&self) -> Option<usize> {
        None
    }
}

/// Length of generated ids.
pub const ID_LENGTH: usize = 8;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a short random id from `[0-9a-z]`.
///
/// No uniqueness check is made; a collision overwrites the older post.
pub fn generate_id() -> String {
    generate_id_with(&mut rand::thread_rng())
}

/// Generate an id from the given random source.
pub fn generate_id_with(rng: &mut impl Rng) -> String {
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Sort posts oldest first, ties broken by id, so listings are stable.
pub(crate) fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}
