pub mod auth_context;

pub use auth_context::{auth_context_middleware, extract_credentials, CurrentAuth};
