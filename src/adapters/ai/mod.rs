//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `GeminiProvider` - Google Gemini models via the REST API
//! - `MockAIProvider` - Configurable mock for testing and offline runs
//! - `RetryingAIProvider` - Wrapper with per-attempt timeout and exponential backoff

mod gemini_provider;
mod mock_provider;
mod retrying_provider;

pub use gemini_provider::{GeminiConfig, GeminiProvider, DEFAULT_GEMINI_BASE_URL};
pub(crate) use gemini_provider::{error_for_status, map_transport_error};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use retrying_provider::{RetryPolicy, RetryingAIProvider};
