//! Corpus fixtures shared by the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use topic_search::corpus::*;
use topic_search::query::{Identity, QueryExecutor, WarningKind, compile};

/// Fixed reference instant for relative dates.
pub fn now() -> DateTime<Utc> {
    at("2024-06-15T12:00:00Z")
}

/// `YYYY-MM-DD` or RFC 3339.
pub fn at(text: &str) -> DateTime<Utc> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).unwrap().and_utc();
    }
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

#[derive(Default)]
pub struct CorpusBuilder {
    data: CorpusData,
    next_message_id: u32,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self {
            next_message_id: 1000,
            ..Self::default()
        }
    }

    pub fn topic(mut self, id: u32, title: &str, created: &str) -> Self {
        self.data.topics.push(Topic {
            id,
            title: title.to_string(),
            created_at: at(created),
            last_message_at: at(created),
            message_count: 0,
            participant_count: 0,
            contributor_count: 0,
        });
        self
    }

    /// Imported counters for a topic that has no messages in the fixture.
    pub fn counts(mut self, topic_id: u32, messages: u32, participants: u32) -> Self {
        let topic = self.topic_mut(topic_id);
        topic.message_count = messages;
        topic.participant_count = participants;
        self
    }

    pub fn alias(mut self, id: u32, name: &str, person_id: Option<u32>) -> Self {
        self.data.aliases.push(Alias {
            id,
            name: name.to_string(),
            email: format!("{}@example.org", name.to_lowercase().replace(' ', ".")),
            person_id,
        });
        self
    }

    pub fn person(mut self, id: u32, role: Option<ContributorRole>) -> Self {
        self.data.people.push(Person { id, role });
        self
    }

    pub fn user(mut self, id: u32, username: &str, person_id: Option<u32>) -> Self {
        self.data.users.push(User {
            id,
            username: username.to_string(),
            person_id,
        });
        self
    }

    /// Add a message, moving the topic's last activity forward.
    pub fn message(mut self, topic_id: u32, sender_id: u32, body: &str, sent: &str) -> Self {
        let created_at = at(sent);
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.data.messages.push(Message {
            id,
            topic_id,
            sender_id,
            body: body.to_string(),
            created_at,
        });
        let topic = self.topic_mut(topic_id);
        if created_at > topic.last_message_at {
            topic.last_message_at = created_at;
        }
        self
    }

    /// Attach a file to the most recent message.
    pub fn attachment(mut self, file_name: &str, content: Option<&str>) -> Self {
        let message_id = self.data.messages.last().map(|m| m.id).unwrap();
        self.data.attachments.push(Attachment {
            message_id,
            file_name: file_name.to_string(),
            content: content.map(str::to_string),
        });
        self
    }

    pub fn note(mut self, topic_id: u32, author_id: u32, tags: &[(&str, &str)]) -> Self {
        self.data.notes.push(Note {
            topic_id,
            author_id,
            body: String::new(),
            tags: tags
                .iter()
                .map(|(name, added)| NoteTag {
                    name: name.to_string(),
                    added_by: author_id,
                    added_at: at(added),
                })
                .collect(),
        });
        self
    }

    pub fn star(mut self, topic_id: u32, user_id: u32) -> Self {
        self.data.stars.push(TopicStar { topic_id, user_id });
        self
    }

    pub fn read(mut self, topic_id: u32, user_id: u32, messages_read: u32) -> Self {
        self.data.read_progress.push(ReadProgress {
            topic_id,
            user_id,
            messages_read,
        });
        self
    }

    pub fn commitfest_patch(mut self, commitfest: &str, topic_id: u32, status: &str, tags: &[&str]) -> Self {
        let commitfest_id = match self.data.commitfests.iter().find(|c| c.name == commitfest) {
            Some(existing) => existing.id,
            None => {
                let id = self.data.commitfests.len() as u32 + 1;
                self.data.commitfests.push(Commitfest {
                    id,
                    name: commitfest.to_string(),
                });
                id
            }
        };
        let id = self.data.commitfest_patches.len() as u32 + 1;
        self.data.commitfest_patches.push(CommitfestPatch {
            id,
            title: format!("patch {}", id),
            topic_ids: vec![topic_id],
            entries: vec![CommitfestEntry {
                commitfest_id,
                status: status.to_string(),
            }],
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    pub fn data(self) -> CorpusData {
        self.data
    }

    pub fn build(self) -> Corpus {
        Corpus::new(self.data)
    }

    fn topic_mut(&mut self, topic_id: u32) -> &mut Topic {
        self.data.topics.iter_mut().find(|t| t.id == topic_id).unwrap()
    }
}

/// Matching topic ids in ascending order.
pub fn search_ids(corpus: &Corpus, query: &str, requester: Option<Identity>) -> Vec<u32> {
    let built = compile(query, now(), requester).unwrap();
    QueryExecutor::new(corpus).execute(&built.predicate).iter().collect()
}

pub fn warning_kinds(query: &str, requester: Option<Identity>) -> Vec<WarningKind> {
    compile(query, now(), requester)
        .unwrap()
        .warnings
        .iter()
        .map(|w| w.kind)
        .collect()
}

/// Two PostgreSQL topics and one MySQL comparison.
pub fn database_corpus() -> Corpus {
    CorpusBuilder::new()
        .person(1, Some(ContributorRole::Committer))
        .person(2, None)
        .alias(10, "Bruce Momjian", Some(1))
        .alias(11, "Jane Doe", Some(2))
        .alias(12, "Drive By", None)
        .user(1, "jane", Some(2))
        .topic(1, "PostgreSQL Performance Guide", "2024-01-10")
        .message(1, 11, "Tips for optimizing PostgreSQL queries", "2024-01-10T09:00:00Z")
        .message(1, 10, "Also look at work_mem", "2024-01-11T09:00:00Z")
        .attachment("v1-0001-planner.patch", None)
        .message(1, 10, "Committed", "2024-03-01T09:00:00Z")
        .topic(2, "MySQL vs PostgreSQL", "2024-02-01")
        .message(2, 12, "Which one should I pick?", "2024-02-01T10:00:00Z")
        .message(2, 11, "Depends on the workload", "2024-02-02T10:00:00Z")
        .topic(3, "Release notes draft", "2024-05-20")
        .message(3, 10, "Draft attached", "2024-05-20T08:00:00Z")
        .attachment("release.txt", Some("plain text"))
        .note(2, 1, &[("needs-followup", "2024-02-05")])
        .star(3, 1)
        .read(1, 1, 3)
        .read(2, 1, 1)
        .commitfest_patch("2024-03", 1, "Committed", &["Performance"])
        .build()
}
