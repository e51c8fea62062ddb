pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthUser, Claims, JwtVerifier, Viewer};
pub use routes::create_router;
pub use state::AppState;
