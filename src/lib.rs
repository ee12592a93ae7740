//! A personal AI companion that remembers.
//!
//! EchoSoul keeps per-user conversation memories with semantic recall, an
//! encrypted private vault, an emotional timeline, and a persisted companion
//! personality. Each chat turn reads the user's emotion, recalls related
//! memories and asks Gemini for a reply in a matching tone. Without a model it
//! falls back to a fixed, style-aware reply.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with FTS5 for keyword search and
//!   [sqlite-vec](https://github.com/asg017/sqlite-vec) for vector search
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions)
//! - **Search**: Hybrid vector + BM25 keyword search merged via Reciprocal Rank Fusion
//! - **Emotions**: keyword lexicon by default, or an ONNX sequence classifier
//! - **Vault**: ChaCha20-Poly1305, never embedded
//! - **Transport**: MCP over stdio or Streamable HTTP, plus a CLI
//!
//! # Modules
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`embedding`]: text-to-vector pipeline
//! - [`emotion`]: classification, conversation mood, and response styles
//! - [`memory`]: store, hybrid search, timeline queries, stats, and deletion
//! - [`timeline`]: timeline entries, emotional statistics, and insights
//! - [`vault`]: encrypted private memories
//! - [`personality`]: the companion's traits
//! - [`account`]: e-mail identified profiles
//! - [`llm`]: Gemini client
//! - [`onnx`]: model loading shared by embeddings and emotions
//! - [`brain`]: the chat pipeline
//! - [`tools`] / [`server`]: the MCP surface

pub mod account;
pub mod brain;
pub mod config;
pub mod db;
pub mod display;
pub mod embedding;
pub mod emotion;
pub mod llm;
pub mod memory;
pub mod onnx;
pub mod personality;
pub mod server;
pub mod timeline;
pub mod tools;
pub mod vault;
