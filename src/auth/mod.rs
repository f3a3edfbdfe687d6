//! The authentication core: credential verification, token minting, and
//! refresh-token rotation.

mod password;
mod service;
mod token;

pub use password::PasswordHasher;
pub use service::AuthService;
pub use token::{Claims, TokenKind, TokenService};
