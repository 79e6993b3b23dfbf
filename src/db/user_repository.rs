use crate::db::credential_repository::StoredCredential;
use crate::db::{
    decode, encode, Database, StoreError, CREDENTIALS_TREE, EMAIL_INDEX_TREE, USERS_TREE,
};
use crate::models::credential::Credential;
use crate::models::user::User;
use bincode::{Decode, Encode};
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use std::str;
use tracing::info;

#[derive(Debug, Encode, Decode)]
pub struct StoredUser {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub user_type: Option<i32>,
    pub created_at: i64, // Store as timestamp
}

impl From<User> for StoredUser {
    fn from(user: User) -> Self {
        StoredUser {
            id: user.id,
            name: user.name,
            email: user.email,
            user_type: user.user_type,
            created_at: user.created_at.timestamp(),
        }
    }
}

impl From<StoredUser> for User {
    fn from(stored: StoredUser) -> Self {
        User {
            id: stored.id,
            name: stored.name,
            email: stored.email,
            user_type: stored.user_type,
            created_at: chrono::DateTime::from_timestamp(stored.created_at, 0)
                .unwrap_or_else(chrono::Utc::now),
        }
    }
}

pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        UserRepository { db }
    }

    /// Write the user, its email index entry and its credential in one transaction.
    /// Either all three land or none do.
    pub async fn create_with_credential(
        &self,
        user: User,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let users_tree = self.db.tree(USERS_TREE)?;
        let email_index = self.db.tree(EMAIL_INDEX_TREE)?;
        let credentials_tree = self.db.tree(CREDENTIALS_TREE)?;

        let credential = Credential {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            password_hash: password_hash.to_string(),
        };
        let encoded_user = encode(&StoredUser::from(user.clone()))?;
        let encoded_credential = encode(&StoredCredential::from(credential))?;

        (&users_tree, &email_index, &credentials_tree).transaction(
            |(users, emails, credentials)| {
                if emails.get(user.email.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StoreError::EmailTaken));
                }
                if credentials.get(user.id.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        StoreError::CredentialExists(user.id.clone()),
                    ));
                }

                users.insert(user.id.as_bytes(), encoded_user.as_slice())?;
                emails.insert(user.email.as_bytes(), user.id.as_bytes())?;
                credentials.insert(user.id.as_bytes(), encoded_credential.as_slice())?;
                Ok(())
            },
        )?;

        info!(user_id = %user.id, email = %user.email, "User and credential created in database");

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users_tree = self.db.tree(USERS_TREE)?;

        match users_tree.get(id.as_bytes())? {
            Some(data) => {
                let stored_user: StoredUser = decode(&data)?;
                Ok(Some(User::from(stored_user)))
            }
            None => Ok(None),
        }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email_index = self.db.tree(EMAIL_INDEX_TREE)?;

        match email_index.get(email.as_bytes())? {
            Some(user_id) => {
                let id = str::from_utf8(&user_id)
                    .map_err(|e| StoreError::Corrupt(format!("invalid user id in email index: {}", e)))?;
                self.get_by_id(id).await
            }
            None => Ok(None),
        }
    }
}
