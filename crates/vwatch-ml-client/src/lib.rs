//! Client for the external event-classification service.
//!
//! The service receives one JPEG frame per request and answers with the
//! events it sees in it. It also exposes a `/summary` endpoint that turns a
//! list of key moments into prose.

pub mod client;
pub mod error;
pub mod types;

pub use client::{
    parse_events, ClassifierConfig, EventClassifier, HttpEventClassifier, MomentSummarizer,
};
pub use error::{ClassifierError, ClassifierResult};
pub use types::{ClassifyRequest, ClassifyResponse, SummaryRequest, SummaryResponse};
