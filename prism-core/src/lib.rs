//! Client-side core of the AI-Prism document review tool.
//!
//! Holds the review state (session, section navigation, analysis cache,
//! feedback decisions, custom feedback, highlights) and the HTTP client for
//! the analysis backend. Front-ends drive [`review::Review`] directly or
//! through [`client::ReviewClient`].

pub mod analysis;
pub mod api;
pub mod client;
pub mod decisions;
pub mod dispatch;
pub mod error;
pub mod highlight;
pub mod http;
pub mod ledger;
pub mod navigator;
pub mod notice;
pub mod review;
pub mod schema;
pub mod session;
pub mod store;
pub mod types;

pub use api::{ReviewApi, UploadRequest};
pub use decisions::{Controls, DecisionAction};
pub use dispatch::{execute, Request, Response};
pub use error::{ApiError, Result, ReviewError, StoreError};
pub use http::HttpApi;
pub use review::{Outcome, Review};
pub use session::Session;
