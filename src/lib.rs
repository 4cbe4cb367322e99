pub mod app;
pub mod config;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod protocol;
pub mod session;
pub mod types;

pub use app::{router, AppState};
pub use error::AppError;
pub use protocol::{PageRenderer, ProtocolResponse};
pub use types::{PageObject, Props};
