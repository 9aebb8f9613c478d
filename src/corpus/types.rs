use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a topic (thread). Also the bit position in result bitmaps.
pub type TopicId = u32;

pub type MessageId = u32;
pub type AliasId = u32;
pub type PersonId = u32;
pub type UserId = u32;
pub type CommitfestId = u32;

/// A discussion thread with its denormalized counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub participant_count: u32,
    #[serde(default)]
    pub contributor_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub topic_id: TopicId,
    /// Sender alias
    pub sender_id: AliasId,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A sender identity (name + email) as it appears on messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub id: AliasId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub person_id: Option<PersonId>,
}

/// Project role of a person, from most to least senior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorRole {
    CoreTeam,
    Committer,
    Contributor,
}

/// A human behind one or more aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    #[serde(default)]
    pub role: Option<ContributorRole>,
}

/// A signed-in account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub person_id: Option<PersonId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub message_id: MessageId,
    pub file_name: String,
    /// Decoded text content, when available
    #[serde(default)]
    pub content: Option<String>,
}

impl Attachment {
    pub fn has_patch_extension(&self) -> bool {
        self.file_name.ends_with(".patch") || self.file_name.ends_with(".diff")
    }

    /// Patch by extension or by diff-looking content.
    pub fn is_patch(&self) -> bool {
        self.has_patch_extension() || self.content.as_deref().is_some_and(looks_like_diff)
    }
}

fn looks_like_diff(content: &str) -> bool {
    const PREFIXES: [&str; 4] = ["diff ", "--- ", "*** ", "Index:"];
    PREFIXES.iter().any(|p| content.starts_with(p))
        || memchr::memmem::find(content.as_bytes(), b"@@").is_some()
        || memchr::memmem::find(content.as_bytes(), b"***************").is_some()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteTag {
    pub name: String,
    pub added_by: UserId,
    pub added_at: DateTime<Utc>,
}

/// A user's note on a topic, optionally carrying tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub topic_id: TopicId,
    pub author_id: UserId,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<NoteTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStar {
    pub topic_id: TopicId,
    pub user_id: UserId,
}

/// How far a user has read into a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadProgress {
    pub topic_id: TopicId,
    pub user_id: UserId,
    pub messages_read: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitfest {
    pub id: CommitfestId,
    pub name: String,
}

/// A patch's state within one commitfest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitfestEntry {
    pub commitfest_id: CommitfestId,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitfestPatch {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub topic_ids: Vec<TopicId>,
    #[serde(default)]
    pub entries: Vec<CommitfestEntry>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// On-disk corpus layout: one JSON object holding every table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusData {
    pub topics: Vec<Topic>,
    pub messages: Vec<Message>,
    pub aliases: Vec<Alias>,
    pub people: Vec<Person>,
    pub users: Vec<User>,
    pub attachments: Vec<Attachment>,
    pub notes: Vec<Note>,
    pub stars: Vec<TopicStar>,
    pub read_progress: Vec<ReadProgress>,
    pub commitfests: Vec<Commitfest>,
    pub commitfest_patches: Vec<CommitfestPatch>,
}
