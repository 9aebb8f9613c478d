use crate::corpus::types::*;
use crate::error::Result;
use crate::utils::tokenize;
use log::{debug, info};
use rayon::prelude::*;
use roaring::RoaringBitmap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs;
use std::path::Path;

/// In-memory corpus with lookup maps and a per-field token index.
#[derive(Debug, Default)]
pub struct Corpus {
    data: CorpusData,
    all_topics: RoaringBitmap,
    topic_index: FxHashMap<TopicId, usize>,
    alias_index: FxHashMap<AliasId, usize>,
    person_index: FxHashMap<PersonId, usize>,
    user_index: FxHashMap<UserId, usize>,
    commitfest_index: FxHashMap<CommitfestId, usize>,
    /// Message positions per topic, oldest first
    messages_by_topic: FxHashMap<TopicId, Vec<usize>>,
    attachments_by_message: FxHashMap<MessageId, Vec<usize>>,
    title_tokens: FxHashMap<String, RoaringBitmap>,
    body_tokens: FxHashMap<String, RoaringBitmap>,
}

impl Corpus {
    pub fn new(mut data: CorpusData) -> Self {
        let topic_index = position_map(&data.topics, |t| t.id);
        let alias_index = position_map(&data.aliases, |a| a.id);
        let person_index = position_map(&data.people, |p| p.id);
        let user_index = position_map(&data.users, |u| u.id);
        let commitfest_index = position_map(&data.commitfests, |c| c.id);
        let all_topics: RoaringBitmap = data.topics.iter().map(|t| t.id).collect();

        let mut messages_by_topic: FxHashMap<TopicId, Vec<usize>> = FxHashMap::default();
        for (pos, message) in data.messages.iter().enumerate() {
            messages_by_topic.entry(message.topic_id).or_default().push(pos);
        }
        for positions in messages_by_topic.values_mut() {
            positions.sort_by_key(|&pos| (data.messages[pos].created_at, data.messages[pos].id));
        }

        let mut attachments_by_message: FxHashMap<MessageId, Vec<usize>> = FxHashMap::default();
        for (pos, attachment) in data.attachments.iter().enumerate() {
            attachments_by_message.entry(attachment.message_id).or_default().push(pos);
        }

        let (title_tokens, body_tokens) = rayon::join(
            || {
                index_tokens(
                    data.topics
                        .par_iter()
                        .map(|topic| (topic.id, tokenize(&topic.title)))
                        .collect(),
                )
            },
            || {
                index_tokens(
                    data.messages
                        .par_iter()
                        .map(|message| (message.topic_id, tokenize(&message.body)))
                        .collect(),
                )
            },
        );

        refresh_counts(&mut data, &messages_by_topic, &alias_index, &person_index);

        info!(
            "corpus: {} topics, {} messages, {} title tokens, {} body tokens",
            data.topics.len(),
            data.messages.len(),
            title_tokens.len(),
            body_tokens.len()
        );

        Self {
            data,
            all_topics,
            topic_index,
            alias_index,
            person_index,
            user_index,
            commitfest_index,
            messages_by_topic,
            attachments_by_message,
            title_tokens,
            body_tokens,
        }
    }

    /// Load a corpus from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("loading corpus from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let data: CorpusData = serde_json::from_str(content)?;
        Ok(Self::new(data))
    }

    pub fn data(&self) -> &CorpusData {
        &self.data
    }

    /// Bitmap of every topic id.
    pub fn all_topics(&self) -> &RoaringBitmap {
        &self.all_topics
    }

    pub fn topics(&self) -> &[Topic] {
        &self.data.topics
    }

    pub fn topic(&self, id: TopicId) -> Option<&Topic> {
        self.topic_index.get(&id).map(|&pos| &self.data.topics[pos])
    }

    pub fn alias(&self, id: AliasId) -> Option<&Alias> {
        self.alias_index.get(&id).map(|&pos| &self.data.aliases[pos])
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.person_index.get(&id).map(|&pos| &self.data.people[pos])
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.user_index.get(&id).map(|&pos| &self.data.users[pos])
    }

    pub fn commitfest(&self, id: CommitfestId) -> Option<&Commitfest> {
        self.commitfest_index.get(&id).map(|&pos| &self.data.commitfests[pos])
    }

    /// Role of the person behind an alias, if any.
    pub fn sender_role(&self, alias_id: AliasId) -> Option<ContributorRole> {
        self.alias(alias_id)
            .and_then(|alias| alias.person_id)
            .and_then(|person_id| self.person(person_id))
            .and_then(|person| person.role)
    }

    /// Messages of a topic, oldest first.
    pub fn messages_in(&self, topic_id: TopicId) -> impl Iterator<Item = &Message> + '_ {
        self.messages_by_topic
            .get(&topic_id)
            .into_iter()
            .flatten()
            .map(|&pos| &self.data.messages[pos])
    }

    pub fn attachments_of(&self, message_id: MessageId) -> impl Iterator<Item = &Attachment> + '_ {
        self.attachments_by_message
            .get(&message_id)
            .into_iter()
            .flatten()
            .map(|&pos| &self.data.attachments[pos])
    }

    pub fn notes(&self) -> &[Note] {
        &self.data.notes
    }

    pub fn stars(&self) -> &[TopicStar] {
        &self.data.stars
    }

    pub fn read_progress(&self) -> &[ReadProgress] {
        &self.data.read_progress
    }

    pub fn commitfest_patches(&self) -> &[CommitfestPatch] {
        &self.data.commitfest_patches
    }

    /// Topics whose title contains `token`.
    pub fn title_postings(&self, token: &str) -> Option<&RoaringBitmap> {
        self.title_tokens.get(token)
    }

    /// Topics with a message body containing `token`.
    pub fn body_postings(&self, token: &str) -> Option<&RoaringBitmap> {
        self.body_tokens.get(token)
    }

    pub fn title_token_count(&self) -> usize {
        self.title_tokens.len()
    }

    pub fn body_token_count(&self) -> usize {
        self.body_tokens.len()
    }
}

fn position_map<T, K: std::hash::Hash + Eq>(rows: &[T], key: impl Fn(&T) -> K) -> FxHashMap<K, usize> {
    rows.iter().enumerate().map(|(pos, row)| (key(row), pos)).collect()
}

fn index_tokens(entries: Vec<(TopicId, Vec<String>)>) -> FxHashMap<String, RoaringBitmap> {
    let mut index: FxHashMap<String, RoaringBitmap> = FxHashMap::default();
    for (topic_id, tokens) in entries {
        for token in tokens {
            index.entry(token).or_default().insert(topic_id);
        }
    }
    index
}

/// Recompute denormalized counters from messages. Topics without messages
/// keep their imported values.
fn refresh_counts(
    data: &mut CorpusData,
    messages_by_topic: &FxHashMap<TopicId, Vec<usize>>,
    alias_index: &FxHashMap<AliasId, usize>,
    person_index: &FxHashMap<PersonId, usize>,
) {
    let CorpusData {
        topics,
        messages,
        aliases,
        people,
        ..
    } = data;

    for topic in topics.iter_mut() {
        let Some(positions) = messages_by_topic.get(&topic.id) else {
            continue;
        };

        // Aliases of the same person count as one participant
        let mut participants: FxHashSet<(bool, u32)> = FxHashSet::default();
        let mut contributors: FxHashSet<u32> = FxHashSet::default();
        for &pos in positions {
            let sender = messages[pos].sender_id;
            let person_id = alias_index
                .get(&sender)
                .and_then(|&a| aliases[a].person_id);
            match person_id {
                Some(person_id) => {
                    participants.insert((true, person_id));
                    let role = person_index.get(&person_id).and_then(|&p| people[p].role);
                    if role.is_some() {
                        contributors.insert(person_id);
                    }
                }
                None => {
                    participants.insert((false, sender));
                }
            }
        }

        topic.message_count = positions.len() as u32;
        topic.participant_count = participants.len() as u32;
        topic.contributor_count = contributors.len() as u32;
    }
}
