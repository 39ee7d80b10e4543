//! JSON endpoints for the page editor: layout metadata, template choices and
//! page form state.

mod error;
pub mod http;
pub mod routes;
mod runtime;

pub use error::ServerError;
pub use http::{Request, Response};
pub use routes::{handle, AppState};
pub use runtime::{init_tracing, run, serve, start_blocking};
