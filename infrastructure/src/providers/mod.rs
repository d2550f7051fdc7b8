//! Model gateway adapters.

#[cfg(feature = "http-provider")]
mod openai_compat;

#[cfg(feature = "http-provider")]
pub use openai_compat::OpenAiCompatGateway;
