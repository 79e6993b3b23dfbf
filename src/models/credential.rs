/// Stored password hash for a user. The plaintext never reaches this type.
#[derive(Clone, PartialEq)]
pub struct Credential {
    pub id: String,
    pub user_id: String,
    pub password_hash: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}
