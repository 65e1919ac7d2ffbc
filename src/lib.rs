//! # style-morph
//!
//! Photo in, styled post out. A user uploads a photo with a style description
//! and a writing instruction; the photo is downscaled, sent to Gemini for a
//! restyled rendition and a caption in the chosen language, and the result is
//! stored under a short id that doubles as a shareable URL.
//!
//! # Flow
//!
//! ```text
//! 1. Route     /id/<id> or /<prompt>/id/<id>  →  id (minted when absent)
//! 2. Compress  upload  →  ≤1024px JPEG data URI
//! 3. Generate  caption ∥ restyle (concurrent)  →  Post
//! 4. Store     Post  →  memory or remote store  →  /id/<id> shows it
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | The [`Post`](types::Post) record shared by store, API, and pages |
//! | [`data_uri`] | `data:<mime>;base64,<payload>` parsing and prefix stripping |
//! | [`imaging`] | Pure-Rust downscale + JPEG re-encode behind the [`ImageBackend`](imaging::ImageBackend) trait |
//! | [`store`] | [`PostStore`](store::PostStore) trait, in-memory and HTTP stores, id generation |
//! | [`generation`] | [`GenerationService`](generation::GenerationService) trait, Gemini client, request dispatch |
//! | [`routing`] | URL path ↔ id / prompt |
//! | [`app`] | The creation flow tying compression, generation and storage together |
//! | [`render`] | Maud HTML pages |
//! | [`server`] | Axum router: JSON API, page handlers, static fallback |
//! | [`config`] | `style-morph.toml` loading and validation, API credential lookup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Traits at the Remote Seams
//!
//! Both remote collaborators, the post store and the generation service, sit
//! behind object-safe async traits. The application holds them as
//! `Arc<dyn ...>`, so the store backend is chosen from config at startup and
//! tests swap in an in-memory store and a scripted generator without any
//! network.
//!
//! ## One Request Type, One Dispatch
//!
//! Which remote calls run is decided once, when form input becomes a
//! [`GenerationRequest`](generation::GenerationRequest). Caption and restyle
//! are awaited together with `tokio::join!`; a failed caption degrades to a
//! placeholder while a failed restyle aborts the post.
//!
//! ## Server-Rendered Pages
//!
//! Pages are rendered with [Maud](https://maud.lambda.xyz/) and forms post
//! `multipart/form-data` back to their own URL, so the service needs no
//! front-end build. A separately built front end can still be served from
//! `server.static_dir` and talk to the JSON API.
//!
//! ## Explicit Store Object
//!
//! The in-memory store is a value created at startup and shared by cloning,
//! not a process global. Its contents live as long as that value.

pub mod app;
pub mod config;
pub mod data_uri;
pub mod generation;
pub mod imaging;
pub mod output;
pub mod render;
pub mod routing;
pub mod server;
pub mod store;
pub mod types;
