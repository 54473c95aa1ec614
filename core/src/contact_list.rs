//! Contact lists (the vendor calls them campaign lists).
//!
//! # Lifecycle
//! A list built with [`ContactList::new`] is new: `id` is 0 until the first
//! successful `save()` creates it remotely and records the assigned id.
//! Lists hydrated by [`ContactList::get`] are never new. Later saves update
//! the remote list in place; after `delete()` succeeds the value should be
//! dropped.

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::client::Client;
use crate::collection::{Collection, Key};
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::types::{CreatedList, ListRecord};

/// One campaign list of the account.
///
/// `id` is 0 and `is_new()` true until the first successful `save()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactList {
    id: i64,
    title: String,
    // Write-only: getLists never returns these.
    before_subscribe_url: String,
    after_subscribe_url: String,
    is_new: bool,
}

impl ContactList {
    pub fn new(title: &str) -> Result<Self> {
        if title.is_empty() {
            return Err(OrmError::EmptyTitle);
        }
        Ok(Self {
            id: 0,
            title: title.to_string(),
            before_subscribe_url: String::new(),
            after_subscribe_url: String::new(),
            is_new: true,
        })
    }

    pub fn from_record(record: &ListRecord) -> Self {
        Self {
            id: record.id.as_i64(),
            title: record.title.clone(),
            before_subscribe_url: String::new(),
            after_subscribe_url: String::new(),
            is_new: false,
        }
    }

    /// Every list of the account, keyed by remote id.
    ///
    /// Fails with `ActionFailed` if the request logged an error; warnings
    /// are only traced.
    pub fn get(client: &Client) -> Result<Collection<ContactList>> {
        let response = client.get_lists()?;
        for warning in response.log.warnings() {
            warn!("getLists warning: {warning}");
        }
        let records: Vec<ListRecord> = match response.into_result()? {
            Some(result) => serde_json::from_value(result)
                .map_err(|e| OrmError::Deserialization(e.to_string()))?,
            None => Vec::new(),
        };

        debug!(count = records.len(), "hydrated contact lists");
        Ok(records
            .iter()
            .map(|record| (Key::Int(record.id.as_i64()), ContactList::from_record(record)))
            .collect())
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn before_subscribe_url(&self) -> &str {
        &self.before_subscribe_url
    }

    pub fn set_before_subscribe_url(&mut self, url: &str) {
        self.before_subscribe_url = url.to_string();
    }

    pub fn after_subscribe_url(&self) -> &str {
        &self.after_subscribe_url
    }

    pub fn set_after_subscribe_url(&mut self, url: &str) {
        self.after_subscribe_url = url.to_string();
    }

    fn create(&mut self, client: &Client) -> Result<()> {
        let response = client.create_list(
            &self.title,
            Some(&self.before_subscribe_url),
            Some(&self.after_subscribe_url),
        )?;
        let created: CreatedList = match response.result {
            Some(result) => serde_json::from_value(result).unwrap_or_default(),
            None => CreatedList::default(),
        };
        let id = created.id().ok_or(OrmError::CreationFailed)?;

        self.id = id;
        self.is_new = false;
        debug!(id, title = %self.title, "created contact list");
        Ok(())
    }

    fn update(&self, client: &Client) -> Result<()> {
        let response = client.update_list(
            self.id,
            &self.title,
            Some(&self.before_subscribe_url),
            Some(&self.after_subscribe_url),
        )?;
        response.log.check(true)
    }
}

impl Entity for ContactList {
    fn is_new(&self) -> bool {
        self.is_new
    }

    fn to_mapping(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert("title".to_string(), json!(self.title));
        map.insert(
            "before_subscribe_url".to_string(),
            json!(self.before_subscribe_url),
        );
        map.insert(
            "after_subscribe_url".to_string(),
            json!(self.after_subscribe_url),
        );
        map
    }

    fn save(&mut self, client: &Client) -> Result<()> {
        if self.is_new {
            self.create(client)
        } else {
            self.update(client)
        }
    }

    fn delete(&mut self, client: &Client) -> Result<bool> {
        let response = client.delete_list(self.id)?;
        response.log.check(true)?;
        debug!(id = self.id, "deleted contact list");
        Ok(true)
    }
}
