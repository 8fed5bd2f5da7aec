//! Services layer.
//!
//! Business logic for authentication and session lifecycle, plus the
//! adapters it talks to (token codec, stores, mail, clock).

mod auth;
mod clock;
mod database;
mod email;
mod store;
mod token;

pub use auth::{AuthService, Token};
pub use clock::{Clock, ManualClock, SystemClock};
pub use database::Database;
pub use email::{Mailer, NullMailer, SmtpMailer};
pub use store::{MemoryStore, SessionStore, UserStore};
pub use token::{TokenClaims, TokenCodec};
