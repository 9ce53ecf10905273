use chrono::{DateTime, Utc};
use uuid::Uuid;

use sb_core::{AuthProvider, IdentityProvider, UserIdentity};

use crate::error::{Result, StoreError};
use crate::store::Store;

const KEY_ID: &str = "identity.id";
const KEY_PROVIDER: &str = "identity.provider";
const KEY_HANDLE: &str = "identity.handle";
const KEY_DISPLAY_NAME: &str = "identity.display_name";
const KEY_SIGNED_IN_AT: &str = "identity.signed_in_at";

const KEYS: [&str; 5] = [
    KEY_ID,
    KEY_PROVIDER,
    KEY_HANDLE,
    KEY_DISPLAY_NAME,
    KEY_SIGNED_IN_AT,
];

/// Identity attached to a profile, recorded in its metadata table.
///
/// No remote handshake happens here: signing in records which account the
/// profile belongs to so exports and sync layers can label it.
pub struct LocalIdentity<'a> {
    store: &'a Store,
}

impl<'a> LocalIdentity<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl IdentityProvider for LocalIdentity<'_> {
    type Error = StoreError;

    fn sign_in(&self, provider: AuthProvider, handle: &str) -> Result<UserIdentity> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(StoreError::InvalidData("handle must not be empty".into()));
        }

        // Re-signing into the same account keeps its id.
        let id = match self.current_user()? {
            Some(user) if user.provider == provider && user.handle == handle => user.id,
            _ => Uuid::new_v4().to_string(),
        };
        let user = UserIdentity {
            id,
            provider,
            handle: handle.to_string(),
            display_name: handle.to_string(),
            signed_in_at: Utc::now(),
        };

        let tx = self.store.conn().unchecked_transaction()?;
        for (key, value) in [
            (KEY_ID, user.id.clone()),
            (KEY_PROVIDER, provider.as_str().to_string()),
            (KEY_HANDLE, user.handle.clone()),
            (KEY_DISPLAY_NAME, user.display_name.clone()),
            (KEY_SIGNED_IN_AT, user.signed_in_at.to_rfc3339()),
        ] {
            tx.execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
                rusqlite::params![key, value],
            )?;
        }
        tx.commit()?;

        tracing::info!(provider = provider.as_str(), handle = %user.handle, "signed in");
        Ok(user)
    }

    fn sign_out(&self) -> Result<()> {
        for key in KEYS {
            self.store.delete_metadata(key)?;
        }
        Ok(())
    }

    fn current_user(&self) -> Result<Option<UserIdentity>> {
        let Some(id) = self.store.get_metadata(KEY_ID)? else {
            return Ok(None);
        };
        let provider_raw = self.required(KEY_PROVIDER)?;
        let provider = AuthProvider::parse(&provider_raw).ok_or_else(|| {
            StoreError::InvalidData(format!("unknown auth provider: {provider_raw}"))
        })?;
        let handle = self.required(KEY_HANDLE)?;
        let display_name = self
            .store
            .get_metadata(KEY_DISPLAY_NAME)?
            .unwrap_or_else(|| handle.clone());
        let signed_in_raw = self.required(KEY_SIGNED_IN_AT)?;
        let signed_in_at = DateTime::parse_from_rfc3339(&signed_in_raw)
            .map_err(|e| StoreError::InvalidData(format!("bad sign-in time: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(UserIdentity {
            id,
            provider,
            handle,
            display_name,
            signed_in_at,
        }))
    }
}

impl LocalIdentity<'_> {
    fn required(&self, key: &str) -> Result<String> {
        self.store
            .get_metadata(key)?
            .ok_or_else(|| StoreError::InvalidData(format!("identity record missing {key}")))
    }
}
