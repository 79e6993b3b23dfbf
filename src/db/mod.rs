pub mod credential_repository;
pub mod refresh_token_repository;
pub mod user_repository;

use thiserror::Error;

pub(crate) const USERS_TREE: &str = "users";
pub(crate) const EMAIL_INDEX_TREE: &str = "email_index";
pub(crate) const CREDENTIALS_TREE: &str = "credentials";
pub(crate) const REFRESH_TOKENS_TREE: &str = "refresh_tokens";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage engine error: {0}")]
    Sled(#[from] sled::Error),

    #[error("failed to encode record: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode record: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("email already exists")]
    EmailTaken,

    #[error("credential already exists for user {0}")]
    CredentialExists(String),
}

impl From<sled::transaction::TransactionError<StoreError>> for StoreError {
    fn from(err: sled::transaction::TransactionError<StoreError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(e) => e,
            sled::transaction::TransactionError::Storage(e) => StoreError::Sled(e),
        }
    }
}

#[derive(Clone)]
pub struct Database {
    pub db: sled::Db,
}

impl Database {
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Database { db })
    }

    /// Throwaway database, removed when the last handle drops.
    #[allow(dead_code)]
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Database { db })
    }

    pub(crate) fn tree(&self, name: &str) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(name)?)
    }

    /// Cheap liveness check used by the health endpoint.
    pub fn is_reachable(&self) -> bool {
        self.tree(USERS_TREE).is_ok()
    }
}

pub(crate) fn encode<T: bincode::Encode>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::encode_to_vec(value, bincode::config::standard())?)
}

pub(crate) fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, StoreError> {
    let (value, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}
