// AI Detector Client Services
// Session state, HTTP client, segment normalization

pub mod api_client;
pub mod segments;
pub mod session;

pub use api_client::{ApiClient, ApiError, ClientConfig, Download};
pub use segments::{merge_segments, partition_text, MergedSegment, TextRun};
pub use session::SessionStore;
