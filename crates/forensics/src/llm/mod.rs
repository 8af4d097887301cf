//! Remote vision-model integration
//!
//! Providers wrap one candidate model each. The fallback chain walks them in
//! priority order, and the factory turns configuration into that chain once at
//! startup. Model output is untrusted text; `json` digs the object out of it.

pub mod config;
pub mod factory;
pub mod fallback;
pub mod json;
pub mod mock_provider;
pub mod prompts;
pub mod provider;
pub mod simulated;

pub use config::{ProviderConfig, SentinelConfig, EXAMPLE_CONFIG};
pub use factory::VisionProviderFactory;
pub use fallback::{FallbackError, ModelFallback};
pub use mock_provider::MockVisionProvider;
pub use provider::{LLMError, OpenAIVisionProvider, VisionProvider, VisionRequest, VisionResponse};
pub use simulated::SimulatedVisionProvider;
