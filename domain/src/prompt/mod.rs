//! Prompt templates for expert sessions and council phases

pub mod persona;
pub mod template;

pub use template::PromptTemplate;
