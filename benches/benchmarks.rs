//! Performance benchmarks for topic-search
//!
//! Run with: cargo bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use topic_search::corpus::*;
use topic_search::query::{Identity, QueryExecutor, build, compile, parse, validate};

const WORDS: &[&str] = &[
    "vacuum", "planner", "replication", "index", "btree", "wal", "checkpoint", "partition",
    "statistics", "lock", "toast", "jit", "parallel", "hash", "join", "sort",
];

/// Synthetic corpus: `topics` threads with five messages each
fn create_benchmark_corpus(topics: u32) -> Corpus {
    let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let mut data = CorpusData::default();

    for person in 0..50u32 {
        data.people.push(Person {
            id: person,
            role: (person % 5 == 0).then_some(ContributorRole::Committer),
        });
        data.aliases.push(Alias {
            id: person,
            name: format!("Person {}", person),
            email: format!("person{}@example.org", person),
            person_id: Some(person),
        });
    }
    data.users.push(User {
        id: 1,
        username: "bench".to_string(),
        person_id: Some(0),
    });

    let mut message_id = 0;
    for id in 0..topics {
        let created = base + Duration::hours(i64::from(id));
        let w = |offset: u32| WORDS[((id + offset) as usize) % WORDS.len()];
        data.topics.push(Topic {
            id,
            title: format!("{} {} {}", w(0), w(3), w(7)),
            created_at: created,
            last_message_at: created + Duration::hours(4),
            message_count: 0,
            participant_count: 0,
            contributor_count: 0,
        });
        for n in 0..5u32 {
            data.messages.push(Message {
                id: message_id,
                topic_id: id,
                sender_id: (id + n * 7) % 50,
                body: format!("about {} and {} with {} details", w(n), w(n + 5), w(n + 11)),
                created_at: created + Duration::hours(i64::from(n)),
            });
            if n == 1 && id % 3 == 0 {
                data.attachments.push(Attachment {
                    message_id,
                    file_name: format!("v{}-0001.patch", n),
                    content: None,
                });
            }
            message_id += 1;
        }
        if id % 10 == 0 {
            data.stars.push(TopicStar { topic_id: id, user_id: 1 });
        }
    }

    Corpus::new(data)
}

const QUERIES: &[&str] = &[
    "vacuum",
    "vacuum planner",
    "\"btree and wal\"",
    "from:person",
    "from:\"Person 5\"[messages:>=2] -has:patch",
    "(vacuum OR lock) first_after:2023-02 messages:>3",
    "-(has:committer OR tag:review) starred:me",
];

fn bench_query_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_parsing");
    for query in QUERIES {
        group.bench_with_input(BenchmarkId::from_parameter(query), query, |b, &q| {
            b.iter(|| parse(black_box(q)))
        });
    }
    group.finish();
}

fn bench_validate_and_build(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let requester = Some(Identity::new(1, Some(0)));

    let mut group = c.benchmark_group("validate_build");
    for query in QUERIES {
        let ast = parse(query).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(query), &ast, |b, ast| {
            b.iter(|| {
                let validated = validate(black_box(ast.as_ref()), now);
                build(validated.ast.as_ref(), requester)
            })
        });
    }
    group.finish();
}

fn bench_corpus_load(c: &mut Criterion) {
    c.bench_function("corpus_build_2k", |b| b.iter(|| create_benchmark_corpus(black_box(2_000))));
}

fn bench_execute(c: &mut Criterion) {
    let corpus = create_benchmark_corpus(10_000);
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let requester = Some(Identity::new(1, Some(0)));

    let mut group = c.benchmark_group("execute");
    for query in QUERIES {
        let built = compile(query, now, requester).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(query), &built, |b, built| {
            let executor = QueryExecutor::new(&corpus);
            b.iter(|| executor.search(black_box(built), 50))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_query_parsing,
    bench_validate_and_build,
    bench_corpus_load,
    bench_execute,
);

criterion_main!(benches);
