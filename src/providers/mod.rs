/*!
 * Provider client implementations.
 *
 * Currently a single OpenAI-compatible chat-completions client, which also
 * covers self-hosted OpenAI-compatible servers via a custom endpoint.
 */

pub mod openai;

pub use openai::OpenAI;
