//! # docqa
//!
//! A document question-answering pipeline.
//!
//! Documents are decoded to plain text, split into overlapping chunks,
//! embedded into vectors, and indexed for nearest-neighbor retrieval.
//! A question is answered by embedding it, retrieving the closest
//! chunks, assembling a token-budgeted context with the selected
//! document's full text in front, and prompting a completion backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────────┐   ┌─────────────┐
//! │  Loader  │──▶│    Pipeline      │──▶│ VectorIndex │
//! │ txt/pdf/ │   │  Chunk + Embed  │   │  (flat L2)  │
//! │   docx   │   └─────────────────┘   └──────┬──────┘
//! └──────────┘                                │
//!                      question ──▶ Embed ──▶ search
//!                                             │
//!                               ┌─────────────▼─────────────┐
//!                               │ ContextAssembler → Prompt │
//!                               │       → Completion        │
//!                               └───────────────────────────┘
//! ```
//!
//! Ingestion runs once per corpus change and atomically replaces the
//! published index ([`store::CorpusStore`]); queries run one at a time
//! against whichever complete version is current.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`error`] | Typed failure taxonomy |
//! | [`models`] | Core data types |
//! | [`loader`] | Multi-format document decoding |
//! | [`chunker`] | Recursive character text splitting |
//! | [`token`] | Approximate token counting |
//! | [`embedding`] | Embedding capability and OpenAI provider |
//! | [`index`] | Flat exhaustive vector index |
//! | [`context`] | Token-budgeted context assembly |
//! | [`completion`] | Completion capability and OpenAI backend |
//! | [`pipeline`] | Ingestion and query orchestration |
//! | [`store`] | Versioned corpus slot with atomic publish |

pub mod chunker;
pub mod completion;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod index;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod token;
