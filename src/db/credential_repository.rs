use crate::db::{decode, encode, Database, StoreError, CREDENTIALS_TREE};
use crate::models::credential::Credential;
use bincode::{Decode, Encode};
use tracing::info;

#[derive(Debug, Encode, Decode)]
pub(crate) struct StoredCredential {
    pub id: String,
    pub user_id: String,
    pub password_hash: String,
}

impl From<Credential> for StoredCredential {
    fn from(credential: Credential) -> Self {
        StoredCredential {
            id: credential.id,
            user_id: credential.user_id,
            password_hash: credential.password_hash,
        }
    }
}

impl From<StoredCredential> for Credential {
    fn from(stored: StoredCredential) -> Self {
        Credential {
            id: stored.id,
            user_id: stored.user_id,
            password_hash: stored.password_hash,
        }
    }
}

/// Credentials keyed by user id, so a user has at most one.
pub struct CredentialRepository {
    db: Database,
}

impl CredentialRepository {
    pub fn new(db: Database) -> Self {
        CredentialRepository { db }
    }

    /// Attach a password hash to a user that has none yet.
    ///
    /// Part of the credential store contract; signup goes through
    /// [`UserRepository::create_with_credential`](crate::db::user_repository::UserRepository::create_with_credential)
    /// instead so the user and credential land in one transaction.
    #[allow(dead_code)]
    pub async fn create(&self, user_id: &str, password_hash: &str) -> Result<Credential, StoreError> {
        let credentials = self.db.tree(CREDENTIALS_TREE)?;

        let credential = Credential {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            password_hash: password_hash.to_string(),
        };
        let encoded = encode(&StoredCredential::from(credential.clone()))?;

        credentials
            .compare_and_swap(user_id.as_bytes(), None as Option<&[u8]>, Some(encoded))?
            .map_err(|_| StoreError::CredentialExists(user_id.to_string()))?;

        info!(user_id = %user_id, "Credential created in database");

        Ok(credential)
    }

    /// Absent means the user has no password set, which is not an error.
    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Credential>, StoreError> {
        let credentials = self.db.tree(CREDENTIALS_TREE)?;

        match credentials.get(user_id.as_bytes())? {
            Some(data) => {
                let stored: StoredCredential = decode(&data)?;
                Ok(Some(Credential::from(stored)))
            }
            None => Ok(None),
        }
    }
}
