//! Benchmarks for the per-call token work
//!
//! This benchmark measures:
//! - History selection over growing conversations
//! - Estimator vs. BPE vs. cached BPE counting
//! - Prompt assembly and reply sanitization

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use chat_orchestrator::context::{ContextWindowManager, TokenBudget};
use chat_orchestrator::prompt::{ChatTemplate, CompletionAssembler, PromptAssembler};
use chat_orchestrator::response::Sanitizer;
use chat_orchestrator::tokens::{
    select_counter, CachingCounter, CharacterEstimator, TokenCounter, TokenizerKind,
};
use chat_orchestrator::Turn;

const PREAMBLE: &str = "You are Alice, a warm and curious companion. Keep replies short, \
                        friendly and on topic. Never pretend to be the user.";

fn conversation(len: usize) -> Vec<Turn> {
    (0..len)
        .map(|i| {
            if i % 2 == 0 {
                Turn::user(format!("User message number {} asking about the weather in Tokyo", i))
            } else {
                Turn::assistant(format!(
                    "Assistant response number {}: it is sunny with a light breeze today",
                    i
                ))
            }
        })
        .collect()
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("context_selection");
    let budget = TokenBudget::new(8000, 512, 100);

    let counters: Vec<(&str, Arc<dyn TokenCounter>)> = vec![
        ("estimate", Arc::new(CharacterEstimator::new())),
        ("cl100k", select_counter(TokenizerKind::Cl100k)),
        (
            "cl100k_cached",
            Arc::new(CachingCounter::new(select_counter(TokenizerKind::Cl100k), 4096)),
        ),
    ];

    for len in [10usize, 100, 1000] {
        let history = conversation(len);
        group.throughput(Throughput::Elements(len as u64));
        for (name, counter) in &counters {
            let manager = ContextWindowManager::new(budget, counter.clone());
            group.bench_with_input(BenchmarkId::new(*name, len), &history, |b, history| {
                b.iter(|| manager.select(black_box(PREAMBLE), black_box(history), "And tomorrow?"))
            });
        }
    }

    group.finish();
}

fn bench_assembly_and_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");
    let history = conversation(50);
    let assembler = CompletionAssembler::new(
        ChatTemplate::default(),
        Arc::new(CharacterEstimator::new()),
    );

    group.bench_function("completion_prompt", |b| {
        b.iter(|| assembler.assemble(black_box(PREAMBLE), black_box(&history), "And tomorrow?"))
    });

    let sanitizer = Sanitizer::default();
    let raw = format!(
        "<|im_start|>assistant\nAssistant: {}<|im_end|>\n<|im_start|>user\nleaked",
        "It is sunny with a light breeze. ".repeat(20)
    );
    group.bench_function("sanitize", |b| b.iter(|| sanitizer.sanitize(black_box(&raw))));

    group.finish();
}

criterion_group!(benches, bench_selection, bench_assembly_and_sanitize);
criterion_main!(benches);
