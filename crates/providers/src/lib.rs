//! Model client implementations for GoClaw.
//!
//! The remote endpoint speaks the OpenAI-compatible chat-completions
//! protocol; [`ZhipuClient`] is the only production implementation of
//! [`goclaw_core::Provider`].

pub mod zhipu;

pub use zhipu::ZhipuClient;
