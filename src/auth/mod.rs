// Authentication module
// Verifies bearer tokens issued by the external identity provider

pub mod error;
pub mod middleware;
pub mod models;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::{AdminUser, AuthenticatedUser};
pub use models::{Claims, Role};
pub use token::TokenService;
