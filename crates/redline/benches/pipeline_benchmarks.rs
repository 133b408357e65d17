//! Pipeline performance benchmarks.
//!
//! Measures the synchronous stages that run for every issue: classification,
//! prompt construction, response parsing, fallback rewriting, and cache lookups.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use redline::cache::{CacheKey, ResultCache};
use redline::llm::{PromptBuilder, ResponseParser};
use redline::suggestion::ParsedSuggestion;
use redline::{ComplexityClassifier, FallbackRewriter, FlaggedIssue, IntelligenceTier, KnowledgeBase};

const DEEP_RESPONSE: &str = "## CORRECTED:\nThe system collects and compresses the logs hourly. It skips open files.\n\n\
## REASONING:\nThe original chained three clauses.\n\n\
## ANALYSIS:\nThe sentence mixed the normal path with an exception.\n\n\
## ALTERNATIVES:\n- Every hour, the system collects and compresses the logs.\n2. The system uploads logs hourly.\n\n\
## EXPLANATION:\nTwo short sentences are easier to scan.";

/// Sample issues covering each fallback rule family.
fn sample_issues() -> Vec<FlaggedIssue> {
    vec![
        FlaggedIssue::new("The report was written by the team.", "passive voice"),
        FlaggedIssue::new("In order to ship, we need tests.", "wordiness"),
        FlaggedIssue::new("We don't think it's ready.", "contractions"),
        FlaggedIssue::new("This is really very important.", "weak modifiers"),
        FlaggedIssue::new(
            "The system collects the logs every hour and it compresses them before uploading \
             them to the archive, but it skips files that are still open.",
            "long sentence",
        ),
        FlaggedIssue::new("Synergy is leveraged across verticals.", "corporate speak"),
    ]
}

/// Responses of growing length made of repeated labeled blocks.
fn padded_response(blocks: usize) -> String {
    let mut response = String::from(DEEP_RESPONSE);
    for i in 0..blocks {
        response.push_str(&format!("\nAdditional commentary line {} with \"quoted text\".", i));
    }
    response
}

fn bench_classify(c: &mut Criterion) {
    let knowledge = KnowledgeBase::builtin().unwrap();
    let classifier = ComplexityClassifier::new();
    let issues = sample_issues();

    c.bench_function("classify_issues", |b| {
        b.iter(|| {
            for issue in &issues {
                if let Some(entry) = knowledge.get(&issue.issue_type) {
                    black_box(classifier.classify(black_box(issue), entry));
                }
            }
        })
    });
}

fn bench_prompt_build(c: &mut Criterion) {
    let knowledge = KnowledgeBase::builtin().unwrap();
    let builder = PromptBuilder::new();
    let issue = FlaggedIssue::new("The report was written by the team.", "passive voice")
        .with_context("Quarterly summary. The report was written by the team. It ships Friday.");
    let entry = knowledge.get(&issue.issue_type).unwrap();

    let mut group = c.benchmark_group("prompt_build");
    for tier in IntelligenceTier::ALL {
        group.bench_with_input(BenchmarkId::new("tier", tier.label()), &tier, |b, tier| {
            b.iter(|| black_box(builder.build(&issue, entry, *tier)))
        });
    }
    group.finish();
}

fn bench_parse_response(c: &mut Criterion) {
    let parser = ResponseParser::new();
    let mut group = c.benchmark_group("parse_response");

    for blocks in [0, 50, 500] {
        let response = padded_response(blocks);
        group.throughput(Throughput::Bytes(response.len() as u64));
        group.bench_with_input(BenchmarkId::new("lines", blocks), &response, |b, response| {
            b.iter(|| black_box(parser.parse(response, IntelligenceTier::Deep, "original")))
        });
    }

    group.finish();
}

fn bench_fallback(c: &mut Criterion) {
    let issues = sample_issues();

    c.bench_function("fallback_rewrite", |b| {
        b.iter(|| {
            for issue in &issues {
                black_box(FallbackRewriter::rewrite(black_box(issue)));
            }
        })
    });
}

fn bench_cache(c: &mut Criterion) {
    let cache = ResultCache::in_memory();
    let keys: Vec<CacheKey> = (0..1_000)
        .map(|i| CacheKey::new(&format!("Sentence number {}.", i), "wordiness", ""))
        .collect();
    for key in &keys {
        cache.put(key.clone(), ParsedSuggestion::new("Rewritten."));
    }

    c.bench_function("cache_get_hit", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(cache.get(&keys[i]))
        })
    });
}

criterion_group!(
    benches,
    bench_classify,
    bench_prompt_build,
    bench_parse_response,
    bench_fallback,
    bench_cache
);
criterion_main!(benches);
