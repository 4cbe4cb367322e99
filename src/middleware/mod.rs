pub mod errors;
pub mod request_view;
pub mod session;
pub mod views;

pub use errors::{error_envelope_middleware, handle_panic};
pub use request_view::request_view_middleware;
pub use session::session_middleware;
pub use views::resolve_view_middleware;
