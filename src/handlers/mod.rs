// handlers/mod.rs - HTTP handlers
//
// Pages render through the SPA bridge; auth handlers only redirect;
// health and the 404 fallback bypass the renderer entirely.

pub mod auth;
pub mod context;
pub mod fallback;
pub mod health;
pub mod pages;

pub use context::PageContext;
pub use fallback::not_found;
pub use health::health;
