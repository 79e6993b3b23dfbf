use crate::db::{decode, encode, Database, StoreError, REFRESH_TOKENS_TREE};
use crate::models::token::RefreshTokenRecord;
use bincode::{Decode, Encode};
use chrono::{DateTime, Utc};

#[derive(Debug, Encode, Decode)]
struct StoredRefreshToken {
    user_id: String,
    access_token_id: String,
    created_at: i64,
    expires_at: i64,
}

impl From<&RefreshTokenRecord> for StoredRefreshToken {
    fn from(record: &RefreshTokenRecord) -> Self {
        StoredRefreshToken {
            user_id: record.user_id.clone(),
            access_token_id: record.access_token_id.clone(),
            created_at: record.created_at.timestamp(),
            expires_at: record.expires_at.timestamp(),
        }
    }
}

impl TryFrom<StoredRefreshToken> for RefreshTokenRecord {
    type Error = StoreError;

    fn try_from(stored: StoredRefreshToken) -> Result<Self, Self::Error> {
        let timestamp = |secs: i64| -> Result<DateTime<Utc>, StoreError> {
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {}", secs)))
        };

        Ok(RefreshTokenRecord {
            user_id: stored.user_id,
            access_token_id: stored.access_token_id,
            created_at: timestamp(stored.created_at)?,
            expires_at: timestamp(stored.expires_at)?,
        })
    }
}

/// Refresh token records keyed by the opaque token string.
pub struct RefreshTokenRepository {
    db: Database,
}

impl RefreshTokenRepository {
    pub fn new(db: Database) -> Self {
        RefreshTokenRepository { db }
    }

    pub async fn insert(&self, token: &str, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        let tree = self.db.tree(REFRESH_TOKENS_TREE)?;
        let encoded = encode(&StoredRefreshToken::from(record))?;
        tree.insert(token.as_bytes(), encoded)?;
        Ok(())
    }

    pub async fn get(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let tree = self.db.tree(REFRESH_TOKENS_TREE)?;

        match tree.get(token.as_bytes())? {
            Some(data) => {
                let stored: StoredRefreshToken = decode(&data)?;
                Ok(Some(RefreshTokenRecord::try_from(stored)?))
            }
            None => Ok(None),
        }
    }

    pub async fn remove(&self, token: &str) -> Result<bool, StoreError> {
        let tree = self.db.tree(REFRESH_TOKENS_TREE)?;
        Ok(tree.remove(token.as_bytes())?.is_some())
    }

    /// Delete every record expired at `now`, returning how many were removed.
    ///
    /// A record rewritten between the scan and the delete is left in place.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let tree = self.db.tree(REFRESH_TOKENS_TREE)?;
        let mut removed = 0;

        for entry in tree.iter() {
            let (key, value) = entry?;
            let record = RefreshTokenRecord::try_from(decode::<StoredRefreshToken>(&value)?)?;
            if !record.is_expired_at(now) {
                continue;
            }
            if tree
                .compare_and_swap(&key, Some(&value), None as Option<&[u8]>)?
                .is_ok()
            {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> RefreshTokenRecord {
        let now = DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap();
        RefreshTokenRecord {
            user_id: "user-1".to_string(),
            access_token_id: "jti-1".to_string(),
            created_at: now,
            expires_at: now + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = RefreshTokenRepository::new(Database::in_memory().unwrap());
        let record = record();

        repo.insert("opaque", &record).await.unwrap();

        let fetched = repo.get("opaque").await.unwrap().unwrap();
        assert_eq!(fetched, record);
        assert!(repo.get("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let repo = RefreshTokenRepository::new(Database::in_memory().unwrap());
        repo.insert("opaque", &record()).await.unwrap();

        assert!(repo.remove("opaque").await.unwrap());
        assert!(!repo.remove("opaque").await.unwrap());
        assert!(repo.get("opaque").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_records() {
        let repo = RefreshTokenRepository::new(Database::in_memory().unwrap());
        let live = record();
        let mut stale = record();
        stale.created_at = live.created_at - Duration::days(10);
        stale.expires_at = live.created_at - Duration::days(3);

        repo.insert("live", &live).await.unwrap();
        repo.insert("stale-1", &stale).await.unwrap();
        repo.insert("stale-2", &stale).await.unwrap();

        assert_eq!(repo.purge_expired(Utc::now()).await.unwrap(), 2);
        assert!(repo.get("stale-1").await.unwrap().is_none());
        assert!(repo.get("stale-2").await.unwrap().is_none());
        assert_eq!(repo.get("live").await.unwrap().unwrap(), live);

        assert_eq!(repo.purge_expired(Utc::now()).await.unwrap(), 0);
    }
}
