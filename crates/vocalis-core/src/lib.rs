#![allow(clippy::must_use_candidate)]

mod context;
mod error;

pub use context::ClientIdentity;
pub use error::{ErrorBody, HttpError, error_response};
