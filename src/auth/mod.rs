//! Caller identity. Accounts and sign-in live in the profile subsystem;
//! this crate only verifies the bearer token and reads the user id from it.

use uuid::Uuid;

pub mod jwt;

/// The viewer behind a request, if any. Logged-out requests read the feed
/// but never mutate it.
pub trait CurrentIdentity {
    fn viewer(&self) -> Option<Uuid>;
}

impl CurrentIdentity for jwt::Claims {
    fn viewer(&self) -> Option<Uuid> {
        Some(self.sub)
    }
}

impl CurrentIdentity for Option<jwt::Claims> {
    fn viewer(&self) -> Option<Uuid> {
        self.as_ref().map(|c| c.sub)
    }
}
