//! # Dispatcher Module
//!
//! The per-request pipeline: lifecycle state machine plus the normalizer that
//! turns handler outcomes into wire responses.
//!
//! ## Request Flow
//!
//! 1. Entry: the request is marked unhandled (`Unmatched`)
//! 2. Every route accepting the verb and path is offered the request, lowest
//!    order first; controller routes skip requests that are already handled
//! 3. A controller route binds parameters, invokes the handler under a
//!    timeout and hands the outcome to [`normalize`]
//! 4. Terminal: an unended response is finalized, as 404 when unhandled
//!
//! ## Error Handling
//!
//! - [`HttpError`](crate::error::HttpError) failures keep their status and
//!   message, rendered as `{"message": ...}`
//! - Every other failure, timeout or panic is a 500 with a generic message;
//!   the cause is logged, never sent
//! - Writes after the response ended are dropped with a warning

mod core;
pub mod normalize;

pub use self::core::Dispatcher;
pub use normalize::{normalize, IntoReply, NoContent, Reply, GENERIC_ERROR_MESSAGE};
