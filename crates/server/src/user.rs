//! The authenticated caller.

/// Username of the caller, inserted by the auth middleware.
///
/// Every handler passes it to the engine as the owning `user_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser(pub String);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}
