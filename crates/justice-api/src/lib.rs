pub mod auth;
pub mod chats;
mod convert;
pub mod error;
mod extract;
pub mod facts;
pub mod middleware;
pub mod reports;
pub mod routes;
pub mod state;
pub mod stories;
pub mod users;
mod validate;

pub use routes::router;
pub use state::{AppState, AppStateInner};
