//! The contract shared by every remote-backed resource.

use serde_json::{Map, Value};

use crate::client::Client;
use crate::error::{OrmError, Result};

/// A local object mirroring one remote record.
///
/// `is_new` is true for an entity built locally and never persisted, and
/// false for one hydrated from a server response or saved at least once.
pub trait Entity {
    fn is_new(&self) -> bool;

    /// Field-by-field serialization of the entity.
    fn to_mapping(&self) -> Map<String, Value>;

    fn field(&self, name: &str) -> Option<Value> {
        self.to_mapping().remove(name)
    }

    /// Persist the entity. Resources that cannot be saved keep the default.
    fn save(&mut self, _client: &Client) -> Result<()> {
        Err(OrmError::SaveNotImplemented)
    }

    /// Delete the remote record; `Ok(false)` means the vendor did not
    /// confirm the deletion.
    fn delete(&mut self, _client: &Client) -> Result<bool> {
        Err(OrmError::DeleteUnsupported)
    }
}
