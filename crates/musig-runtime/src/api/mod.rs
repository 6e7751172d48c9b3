//! Transport-agnostic coordination API.
//!
//! | Operation | Handler | Result |
//! |-----------|---------|--------|
//! | list | `handle_list` | records with derived state |
//! | show | `handle_show` | record or not-found |
//! | store | `handle_store` | `{ id }` |
//! | delete | `handle_delete` | `{ id }` or not-found |
//! | delete all | `handle_delete_all` | `{ removed }` |

pub mod error;
pub mod handler;
pub mod payloads;

pub use error::{codes, ApiError, ApiResult};
pub use handler::ApiHandler;
pub use payloads::{IdResponse, ListQuery, RemovedResponse, StoreRequest, TransactionView};
