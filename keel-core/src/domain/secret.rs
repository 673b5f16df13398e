//! Secret material and cluster secret objects
//!
//! Secret material only lives in memory for the duration of a run. It is
//! wrapped in [`secrecy::Secret`] so it never shows up in `Debug` output or
//! logs, and it is never written to disk.

use secrecy::{ExposeSecret, Secret};
use serde_json::{Map, Value, json};
use std::fmt;

use crate::error::SecretError;

/// A credential fetched from the secret store
pub struct SecretMaterial {
    name: String,
    value: Secret<String>,
}

impl SecretMaterial {
    /// Wraps the raw bytes returned by the secret store
    ///
    /// The payload is kept byte-for-byte; no trimming is applied.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, SecretError> {
        let name = name.into();

        if bytes.is_empty() {
            return Err(SecretError::Empty { name });
        }

        let value = String::from_utf8(bytes).map_err(|_| SecretError::NotUtf8 {
            name: name.clone(),
        })?;

        Ok(Self {
            name,
            value: Secret::new(value),
        })
    }

    /// Name of the secret in the store
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Secret<String> {
        &self.value
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretMaterial")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

/// A cluster-native secret object with a single key
///
/// The object is rendered as a declarative `v1/Secret` document and
/// submitted with reconcile semantics, so publishing it twice converges on
/// the same object instead of failing because it already exists.
#[derive(Debug)]
pub struct ClusterSecret {
    pub name: String,
    pub key: String,
    value: Secret<String>,
}

impl ClusterSecret {
    /// Builds the cluster secret from fetched material, consuming it
    pub fn from_material(
        name: impl Into<String>,
        key: impl Into<String>,
        material: SecretMaterial,
    ) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            value: material.value,
        }
    }

    /// Renders the declarative document for this secret
    ///
    /// The returned JSON contains the plaintext value, so it stays wrapped
    /// in a [`Secret`] until it is handed to the cluster.
    pub fn to_document(&self) -> Result<Secret<String>, SecretError> {
        let mut string_data = Map::new();
        string_data.insert(
            self.key.clone(),
            Value::String(self.value.expose_secret().clone()),
        );

        let document = json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {
                "name": self.name,
            },
            "type": "Opaque",
            "stringData": string_data,
        });

        serde_json::to_string_pretty(&document)
            .map(Secret::new)
            .map_err(|source| SecretError::Serialize {
                name: self.name.clone(),
                source,
            })
    }
}
