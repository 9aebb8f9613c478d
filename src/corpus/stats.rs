use crate::corpus::store::Corpus;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Summary of a loaded corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStats {
    pub topics: usize,
    pub messages: usize,
    pub aliases: usize,
    pub users: usize,
    pub attachments: usize,
    pub patches: usize,
    pub notes: usize,
    pub stars: usize,
    pub commitfests: usize,
    pub commitfest_patches: usize,
    pub title_tokens: usize,
    pub body_tokens: usize,
    pub oldest_topic: Option<DateTime<Utc>>,
    pub latest_activity: Option<DateTime<Utc>>,
    /// Most used note tags, most frequent first
    pub top_tags: Vec<(String, usize)>,
}

impl CorpusStats {
    pub fn collect(corpus: &Corpus) -> Self {
        let data = corpus.data();

        let mut tag_counts: FxHashMap<&str, usize> = FxHashMap::default();
        for tag in data.notes.iter().flat_map(|note| &note.tags) {
            *tag_counts.entry(tag.name.as_str()).or_insert(0) += 1;
        }
        let mut top_tags: Vec<(String, usize)> = tag_counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        top_tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_tags.truncate(10);

        Self {
            topics: data.topics.len(),
            messages: data.messages.len(),
            aliases: data.aliases.len(),
            users: data.users.len(),
            attachments: data.attachments.len(),
            patches: data.attachments.iter().filter(|a| a.is_patch()).count(),
            notes: data.notes.len(),
            stars: data.stars.len(),
            commitfests: data.commitfests.len(),
            commitfest_patches: data.commitfest_patches.len(),
            title_tokens: corpus.title_token_count(),
            body_tokens: corpus.body_token_count(),
            oldest_topic: data.topics.iter().map(|t| t.created_at).min(),
            latest_activity: data.topics.iter().map(|t| t.last_message_at).max(),
            top_tags,
        }
    }
}

/// Display corpus statistics
pub fn show_stats(corpus: &Corpus) {
    let stats = CorpusStats::collect(corpus);

    println!("Corpus Statistics");
    println!("=================");
    println!();
    println!("Topics:           {}", stats.topics);
    println!("Messages:         {}", stats.messages);
    println!("Aliases:          {}", stats.aliases);
    println!("Users:            {}", stats.users);
    println!("Attachments:      {} ({} patches)", stats.attachments, stats.patches);
    println!("Notes:            {}", stats.notes);
    println!("Stars:            {}", stats.stars);
    println!("Commitfests:      {}", stats.commitfests);
    println!("CF patches:       {}", stats.commitfest_patches);
    println!("Title tokens:     {}", stats.title_tokens);
    println!("Body tokens:      {}", stats.body_tokens);

    if let (Some(oldest), Some(latest)) = (stats.oldest_topic, stats.latest_activity) {
        println!();
        println!("Oldest topic:     {}", oldest.format("%Y-%m-%d"));
        println!("Latest activity:  {}", latest.format("%Y-%m-%d"));
    }

    if !stats.top_tags.is_empty() {
        println!();
        println!("Top tags:");
        for (name, count) in &stats.top_tags {
            println!("  {:20} {}", name, count);
        }
    }
}
