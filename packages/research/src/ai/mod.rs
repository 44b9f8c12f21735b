//! Provider adapters implementing [`ResearchAI`](crate::traits::ai::ResearchAI).
//!
//! Each adapter owns its prompting, wire format and streaming; the
//! orchestrator only ever sees the capability trait. The provider is
//! chosen once at the boundary via [`from_selector`] and never re-checked
//! inside the research loop.

pub mod prompts;
pub mod response;
pub mod sse;

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "gemini")]
pub use gemini::Gemini;
#[cfg(feature = "openai")]
pub use openai::OpenAI;

use crate::error::{ResearchError, Result};
use crate::traits::ai::ResearchAI;
use crate::types::config::ModelSelector;

/// Build the model capability for a provider selector.
///
/// Credentials come from the environment (`OPENAI_API_KEY`,
/// `GOOGLE_API_KEY`). Unknown providers, and providers whose feature is
/// not compiled in, yield [`ResearchError::UnsupportedProvider`].
pub fn from_selector(selector: &ModelSelector) -> Result<Box<dyn ResearchAI>> {
    match selector.provider.as_str() {
        #[cfg(feature = "openai")]
        "openai" => {
            let mut ai = OpenAI::from_env()?;
            if let Some(model) = &selector.model {
                ai = ai.with_model(model);
            }
            Ok(Box::new(ai))
        }
        #[cfg(feature = "gemini")]
        "gemini" | "google" => {
            let mut ai = Gemini::from_env()?;
            if let Some(model) = &selector.model {
                ai = ai.with_model(model);
            }
            Ok(Box::new(ai))
        }
        other => Err(ResearchError::UnsupportedProvider(other.to_string())),
    }
}
