//! Response models
//!
//! Everything the server sends back is wrapped in an [`Envelope`].

mod envelope;
mod prediction;
mod user;

pub(crate) use envelope::*;
pub(crate) use prediction::*;
pub(crate) use user::*;
