//! JWT issuance and validation for the shop API.
//!
//! Access and refresh tokens are signed with independent secrets and
//! expiries (30 minutes / 365 days by default, mirroring the upstream
//! token service). Handlers receive the caller's identity through the
//! [`AuthUser`] and [`AdminUser`] extractors.

pub mod error;
pub mod extract;
pub mod token;

pub use error::AuthError;
pub use extract::{AdminUser, AuthUser};
pub use token::{Claims, Role, TokenConfig, TokenPair, TokenService, TokenUse};
