//! Serde shapes for the server's HTTP APIs.
//!
//! `request`/`response` cover the OpenAI-compatible chat and text completion
//! endpoints; `native` covers SGLang's own `/generate` endpoint used for scoring.

pub(crate) mod native;
pub(crate) mod request;
pub(crate) mod response;

pub(crate) use native::*;
pub(crate) use request::*;
pub(crate) use response::*;
