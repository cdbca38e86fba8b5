use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

/// A user as seen by the assignment picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

/// Read-only view of the chat system's users and who has talked to whom.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// The subset of `ids` that exist, in no particular order.
    async fn find_users(&self, ids: &[String]) -> Result<Vec<Contact>, ApiError>;
    /// Everyone `user_id` has exchanged at least one message with.
    async fn chat_contacts(&self, user_id: &str) -> Result<Vec<Contact>, ApiError>;
}

/// Why an assignee list was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeProblem {
    NotAContact,
    UnknownUser,
}

/// Check that every id in `assignees` is a chat contact of `caller` and an
/// existing user. `assignees` must already be deduplicated.
pub async fn check_assignees(
    contacts: &dyn ContactDirectory,
    caller: &str,
    assignees: &[String],
) -> Result<Option<AssigneeProblem>, ApiError> {
    let known: HashSet<String> = contacts
        .chat_contacts(caller)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    if assignees.iter().any(|id| !known.contains(id)) {
        return Ok(Some(AssigneeProblem::NotAContact));
    }

    let found = contacts.find_users(assignees).await?;
    if found.len() != assignees.len() {
        return Ok(Some(AssigneeProblem::UnknownUser));
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Directory {
    users: BTreeMap<String, Contact>,
    conversations: HashMap<String, HashSet<String>>,
}

/// Seed file layout for `CONTACTS_FILE`.
#[derive(Debug, Default, Deserialize)]
struct ContactsSeed {
    #[serde(default)]
    users: Vec<Contact>,
    /// Pairs of user ids that have chatted.
    #[serde(default)]
    conversations: Vec<(String, String)>,
}

#[derive(Default)]
pub struct MemoryContacts {
    inner: RwLock<Directory>,
}

impl MemoryContacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ApiError> {
        let raw = std::fs::read_to_string(path)?;
        let seed: ContactsSeed = serde_json::from_str(&raw)?;

        let contacts = Self::new();
        for user in seed.users {
            contacts.add_user(user);
        }
        for (a, b) in &seed.conversations {
            contacts.record_conversation(a, b);
        }
        tracing::info!(
            path = %path.display(),
            users = contacts.inner.read().users.len(),
            "loaded contact directory"
        );
        Ok(contacts)
    }

    pub fn add_user(&self, user: Contact) {
        self.inner.write().users.insert(user.id.clone(), user);
    }

    /// Mark two users as having chatted. Symmetric.
    pub fn record_conversation(&self, a: &str, b: &str) {
        if a == b {
            return;
        }
        let mut inner = self.inner.write();
        inner
            .conversations
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        inner
            .conversations
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }
}

#[async_trait]
impl ContactDirectory for MemoryContacts {
    async fn find_users(&self, ids: &[String]) -> Result<Vec<Contact>, ApiError> {
        let inner = self.inner.read();
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }

    async fn chat_contacts(&self, user_id: &str) -> Result<Vec<Contact>, ApiError> {
        let inner = self.inner.read();
        let Some(peers) = inner.conversations.get(user_id) else {
            return Ok(Vec::new());
        };
        let mut contacts: Vec<Contact> = peers
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect();
        contacts.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(contacts)
    }
}
