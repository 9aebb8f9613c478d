use crate::corpus::{Alias, ContributorRole, Corpus, Message, Topic, TopicId, User};
use crate::query::ast::Artifact;
use crate::query::builder::BuiltQuery;
use crate::query::predicate::*;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A matching topic, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicHit {
    pub id: TopicId,
    pub title: String,
    pub last_message_at: DateTime<Utc>,
    pub message_count: u32,
}

/// Evaluates predicates against an in-memory corpus
pub struct QueryExecutor<'a> {
    corpus: &'a Corpus,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(corpus: &'a Corpus) -> Self {
        Self { corpus }
    }

    /// Run a built query and return hits, newest activity first.
    /// A `limit` of 0 returns everything.
    pub fn search(&self, query: &BuiltQuery, limit: usize) -> Vec<TopicHit> {
        let matched = self.execute(&query.predicate);

        let mut topics: Vec<&Topic> = matched.iter().filter_map(|id| self.corpus.topic(id)).collect();
        topics.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at).then(a.id.cmp(&b.id)));
        if limit > 0 {
            topics.truncate(limit);
        }

        topics
            .into_iter()
            .map(|topic| TopicHit {
                id: topic.id,
                title: topic.title.clone(),
                last_message_at: topic.last_message_at,
                message_count: topic.message_count,
            })
            .collect()
    }

    /// Evaluate `predicate` to the set of matching topic ids.
    pub fn execute(&self, predicate: &Predicate) -> RoaringBitmap {
        match predicate {
            Predicate::All => self.corpus.all_topics().clone(),
            Predicate::Nothing => RoaringBitmap::new(),
            Predicate::Text { text, fields } => self.text_topics(text, *fields),
            Predicate::Author { author, scope } => {
                self.scan_topics(|topic| self.author_matches(topic.id, author, scope))
            }
            Predicate::Date { field, range } => self.scan_topics(|topic| match field {
                DateField::First => range.contains(topic.created_at),
                DateField::Last => range.contains(topic.last_message_at),
                DateField::AnyMessage => self
                    .corpus
                    .messages_in(topic.id)
                    .any(|message| range.contains(message.created_at)),
            }),
            Predicate::Count { field, filter } => self.scan_topics(|topic| {
                let actual = match field {
                    CountField::Messages => topic.message_count,
                    CountField::Participants => topic.participant_count,
                    CountField::Contributors => topic.contributor_count,
                };
                filter.matches(u64::from(actual))
            }),
            Predicate::Has { artifact, scope } => {
                self.scan_topics(|topic| self.artifact_matches(topic.id, *artifact, scope))
            }
            Predicate::Tag { name, scope } => self.tag_topics(name.as_deref(), scope),
            Predicate::Commitfest { name, scope } => self.commitfest_topics(name.as_deref(), scope),
            Predicate::Status { status } => self.commitfest_topics(
                None,
                &CommitfestScope {
                    status: Some(status.clone()),
                    tag: None,
                },
            ),
            Predicate::State { state, user_id } => self.state_topics(*state, *user_id),
            Predicate::Not { inner } => self.corpus.all_topics() - self.execute(inner),
            Predicate::And { children } => {
                let mut result = self.corpus.all_topics().clone();
                for child in children {
                    if result.is_empty() {
                        break;
                    }
                    result &= self.execute(child);
                }
                result
            }
            Predicate::Or { children } => {
                let mut result = RoaringBitmap::new();
                for child in children {
                    result |= self.execute(child);
                }
                result
            }
        }
    }

    /// Topics satisfying a per-topic test, checked in parallel.
    fn scan_topics(&self, test: impl Fn(&Topic) -> bool + Sync) -> RoaringBitmap {
        let mut ids: Vec<TopicId> = self
            .corpus
            .topics()
            .par_iter()
            .filter(|topic| test(topic))
            .map(|topic| topic.id)
            .collect();
        ids.sort_unstable();
        ids.into_iter().collect()
    }

    fn text_topics(&self, text: &TextMatch, fields: TextFields) -> RoaringBitmap {
        let tokens = text.tokens();
        if tokens.is_empty() {
            // Phrase: verify against the stored text
            return self.scan_topics(|topic| {
                let in_title =
                    fields != TextFields::Body && text.matches(&topic.title);
                in_title
                    || (fields != TextFields::Title
                        && self.corpus.messages_in(topic.id).any(|m| text.matches(&m.body)))
            });
        }

        let mut result: Option<RoaringBitmap> = None;
        for token in &tokens {
            let mut postings = RoaringBitmap::new();
            if fields != TextFields::Body {
                if let Some(title) = self.corpus.title_postings(token) {
                    postings |= title;
                }
            }
            if fields != TextFields::Title {
                if let Some(body) = self.corpus.body_postings(token) {
                    postings |= body;
                }
            }
            result = Some(match result {
                Some(acc) => acc & postings,
                None => postings,
            });
        }
        result.unwrap_or_default()
    }

    fn sender_matches(&self, message: &Message, author: &AuthorMatch) -> bool {
        match author {
            AuthorMatch::Any => true,
            AuthorMatch::Name(needle) => self
                .corpus
                .alias(message.sender_id)
                .is_some_and(|alias| alias_matches(alias, needle)),
            AuthorMatch::Person(person_id) => self
                .corpus
                .alias(message.sender_id)
                .is_some_and(|alias| alias.person_id == Some(*person_id)),
            AuthorMatch::User(user_id) => {
                let person = self.corpus.user(*user_id).and_then(|user| user.person_id);
                person.is_some()
                    && self
                        .corpus
                        .alias(message.sender_id)
                        .is_some_and(|alias| alias.person_id == person)
            }
        }
    }

    fn author_matches(&self, topic_id: TopicId, author: &AuthorMatch, scope: &MessageScope) -> bool {
        let mut count = 0u64;
        let mut first: Option<DateTime<Utc>> = None;
        let mut last: Option<DateTime<Utc>> = None;

        for message in self.corpus.messages_in(topic_id) {
            if !scope.window.contains(message.created_at) || !self.sender_matches(message, author) {
                continue;
            }
            if scope.body.as_ref().is_some_and(|body| !body.matches(&message.body)) {
                continue;
            }
            count += 1;
            first = Some(first.map_or(message.created_at, |t| t.min(message.created_at)));
            last = Some(last.map_or(message.created_at, |t| t.max(message.created_at)));
        }

        // The author must have posted before any count condition applies
        count > 0
            && scope.count.as_ref().is_none_or(|filter| filter.matches(count))
            && bound_holds(&scope.first, first)
            && bound_holds(&scope.last, last)
    }

    fn artifact_matches(&self, topic_id: TopicId, artifact: Artifact, scope: &ArtifactScope) -> bool {
        let mut count = 0u64;
        for message in self.corpus.messages_in(topic_id) {
            if !scope.window.contains(message.created_at) || !self.sender_matches(message, &scope.author) {
                continue;
            }
            count += match artifact {
                Artifact::Attachment => self.corpus.attachments_of(message.id).count() as u64,
                Artifact::Patch => self
                    .corpus
                    .attachments_of(message.id)
                    .filter(|attachment| attachment.is_patch())
                    .count() as u64,
                Artifact::Contributor | Artifact::Committer | Artifact::CoreTeam => {
                    let role = self.corpus.sender_role(message.sender_id);
                    u64::from(role_matches(artifact, role))
                }
            };
        }
        count > 0 && scope.count.matches(count)
    }

    fn tagger_matches(&self, user_id: u32, author: &AuthorMatch) -> bool {
        let user = self.corpus.user(user_id);
        match author {
            AuthorMatch::Any => true,
            AuthorMatch::User(id) => *id == user_id,
            AuthorMatch::Person(person_id) => user.is_some_and(|u| u.person_id == Some(*person_id)),
            AuthorMatch::Name(needle) => user.is_some_and(|u| username_matches(u, needle)),
        }
    }

    fn tag_topics(&self, name: Option<&str>, scope: &TagScope) -> RoaringBitmap {
        let mut result = RoaringBitmap::new();
        for note in self.corpus.notes() {
            let tagged = note.tags.iter().any(|tag| {
                name.is_none_or(|prefix| tag.name.to_lowercase().starts_with(prefix))
                    && scope.added_before.is_none_or(|before| tag.added_at < before)
                    && scope
                        .added_by
                        .as_ref()
                        .is_none_or(|by| self.tagger_matches(tag.added_by, by))
            });
            if tagged {
                result.insert(note.topic_id);
            }
        }
        result
    }

    fn commitfest_topics(&self, name: Option<&str>, scope: &CommitfestScope) -> RoaringBitmap {
        let mut result = RoaringBitmap::new();
        for patch in self.corpus.commitfest_patches() {
            let tag_ok = scope.tag.as_deref().is_none_or(|prefix| {
                patch.tags.iter().any(|tag| tag.to_lowercase().starts_with(prefix))
            });
            if !tag_ok {
                continue;
            }
            let entry_ok = patch.entries.iter().any(|entry| {
                let name_ok = name.is_none_or(|prefix| {
                    self.corpus
                        .commitfest(entry.commitfest_id)
                        .is_some_and(|cf| cf.name.to_lowercase().starts_with(prefix))
                });
                let status_ok = scope
                    .status
                    .as_deref()
                    .is_none_or(|prefix| entry.status.to_lowercase().starts_with(prefix));
                name_ok && status_ok
            });
            if entry_ok {
                result.extend(patch.topic_ids.iter().copied());
            }
        }
        result
    }

    fn state_topics(&self, state: StateKind, user_id: u32) -> RoaringBitmap {
        match state {
            StateKind::Starred => self
                .corpus
                .stars()
                .iter()
                .filter(|star| star.user_id == user_id)
                .map(|star| star.topic_id)
                .collect(),
            StateKind::Notes => self
                .corpus
                .notes()
                .iter()
                .filter(|note| note.author_id == user_id)
                .map(|note| note.topic_id)
                .collect(),
            StateKind::Read | StateKind::Reading | StateKind::Unread | StateKind::New => {
                let progress: FxHashMap<TopicId, u32> = self
                    .corpus
                    .read_progress()
                    .iter()
                    .filter(|p| p.user_id == user_id)
                    .map(|p| (p.topic_id, p.messages_read))
                    .collect();
                let fully_read = |topic: &Topic| {
                    progress
                        .get(&topic.id)
                        .is_some_and(|&read| read >= topic.message_count)
                };
                match state {
                    StateKind::Read => self.scan_topics(fully_read),
                    StateKind::Reading => self.scan_topics(|topic| {
                        progress
                            .get(&topic.id)
                            .is_some_and(|&read| read > 0 && read < topic.message_count)
                    }),
                    StateKind::Unread => self.scan_topics(|topic| !fully_read(topic)),
                    _ => self.scan_topics(|topic| !progress.contains_key(&topic.id)),
                }
            }
        }
    }
}

fn bound_holds(range: &DateRange, instant: Option<DateTime<Utc>>) -> bool {
    range.is_unbounded() || instant.is_some_and(|t| range.contains(t))
}

fn alias_matches(alias: &Alias, needle: &str) -> bool {
    alias.name.to_lowercase().contains(needle) || alias.email.to_lowercase().contains(needle)
}

fn username_matches(user: &User, needle: &str) -> bool {
    user.username.to_lowercase().contains(needle)
}

fn role_matches(artifact: Artifact, role: Option<ContributorRole>) -> bool {
    match artifact {
        Artifact::Contributor => role.is_some(),
        Artifact::Committer => role == Some(ContributorRole::Committer),
        Artifact::CoreTeam => role == Some(ContributorRole::CoreTeam),
        Artifact::Attachment | Artifact::Patch => false,
    }
}
