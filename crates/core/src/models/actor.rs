/// The already-authenticated caller of an operation.
///
/// Token verification happens upstream; this is only the resulting group claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Admin,
    User { identity_id: String },
}

impl Actor {
    pub fn user(identity_id: impl Into<String>) -> Self {
        Actor::User {
            identity_id: identity_id.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin)
    }
}
