//! On-disk snapshot of the session, used to skip logging in on restart.
//!
//! # Design
//! The file holds the cookie jar and the raw login response, nothing else.
//! There is no expiry metadata: a stale session is only discovered when the
//! API answers 403. Loading is deliberately forgiving: any read, parse or
//! shape problem means "no state" and the caller logs in again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Identifiers the client derives from a login response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    #[serde(rename = "uuid")]
    pub user_id: String,
    #[serde(rename = "homeClubUuid")]
    pub home_gym: String,
}

impl Identity {
    /// Extract `uuid` and `homeClubUuid` from a login response body.
    pub fn from_login_response(login_resp: &Value) -> Result<Self, ApiError> {
        Identity::deserialize(login_resp)
            .map_err(|e| ApiError::DeserializationError(format!("login response: {e}")))
    }
}

/// Contents of the state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub cookies: BTreeMap<String, String>,
    /// The login response body exactly as the server returned it.
    pub login_resp: Value,
}

impl PersistedState {
    pub fn identity(&self) -> Result<Identity, ApiError> {
        Identity::from_login_response(&self.login_resp)
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state file. Returns `None` if it is missing, unreadable,
    /// not valid JSON, or lacks the login identifiers.
    pub fn load(&self) -> Option<(PersistedState, Identity)> {
        match self.try_load() {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                tracing::error!("failed to load state from {}: {e}", self.path.display());
                None
            }
        }
    }

    fn try_load(&self) -> Result<(PersistedState, Identity), ApiError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| ApiError::StateFile(e.to_string()))?;
        let state: PersistedState =
            serde_json::from_str(&raw).map_err(|e| ApiError::StateFile(e.to_string()))?;
        let identity = state.identity()?;
        Ok((state, identity))
    }

    /// Overwrite the state file with `state`.
    pub fn save(&self, state: &PersistedState) -> Result<(), ApiError> {
        let json = serde_json::to_string(state).map_err(|e| ApiError::StateFile(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| ApiError::StateFile(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store(dir: &tempfile::TempDir) -> StateStore {
        StateStore::new(dir.path().join("state.json"))
    }

    fn sample_state() -> PersistedState {
        PersistedState {
            cookies: BTreeMap::from([("JSESSIONID".to_string(), "abc".to_string())]),
            login_resp: json!({"uuid": "u1", "homeClubUuid": "g1", "firstName": "Sam"}),
        }
    }

    #[test]
    fn missing_file_is_no_state() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(&dir).load().is_none());
    }

    #[test]
    fn saved_state_loads_back_with_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&sample_state()).unwrap();

        let (state, identity) = store.load().unwrap();
        assert_eq!(state, sample_state());
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.home_gym, "g1");
    }

    #[test]
    fn file_uses_cookies_and_login_resp_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&sample_state()).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["cookies"]["JSESSIONID"], "abc");
        assert_eq!(raw["login_resp"]["firstName"], "Sam");
    }

    #[test]
    fn garbage_file_is_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn login_resp_without_uuid_is_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::write(
            store.path(),
            r#"{"cookies":{},"login_resp":{"homeClubUuid":"g1"}}"#,
        )
        .unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn missing_cookies_key_is_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::write(store.path(), r#"{"login_resp":{"uuid":"u1","homeClubUuid":"g1"}}"#).unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn identity_requires_string_fields() {
        let err = Identity::from_login_response(&json!({"uuid": 7, "homeClubUuid": "g"})).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}
