//! The agent loop: the heart of GoClaw.
//!
//! One user turn runs as follows:
//!
//! 1. **Persist** the user message
//! 2. **Build context**: base system prompt + workspace files + recent history
//! 3. **Send to the model** with every registered tool
//! 4. **If tool calls**: execute them in order, append results, go back to 3
//! 5. **If text**: persist it as the assistant reply and return it
//!
//! Only the user message and the final reply reach the store; the
//! intermediate tool traffic lives for one turn only.

pub mod loop_runner;
pub mod prompt;

pub use loop_runner::Agent;
pub use prompt::{build_system_prompt, BASE_SYSTEM_PROMPT};
