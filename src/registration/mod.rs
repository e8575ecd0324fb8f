//! Group registration service
//!
//! Users register once, are assigned to a fixed group bucket, and can log in
//! to receive a session token.

mod groups;
mod session;
mod store;

pub use groups::{GroupAllocator, GroupLoad};
pub use session::{Claims, SessionError, SessionIssuer, SessionToken, MIN_SECRET_LEN};
pub use store::{RegistrationError, RegistrationRequest, RegistrationStore, UserRecord};
