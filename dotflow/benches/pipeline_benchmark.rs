//! Benchmarks for graph parsing and guard evaluation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;

use dotflow::{evaluate_condition, AttrValue, Context, Graph};

fn pipeline_text(steps: usize) -> String {
    let mut text = String::from("digraph bench {\n    goal=\"benchmark\";\n    start [shape=Mdiamond];\n    exit [shape=Msquare];\n");
    for i in 0..steps {
        text.push_str(&format!(
            "    step_{i} [shape=box, prompt=\"step {i}\", max_retries=1];\n"
        ));
    }
    text.push_str("    start -> step_0;\n");
    for i in 1..steps {
        text.push_str(&format!("    step_{} -> step_{} [weight={}];\n", i - 1, i, i));
    }
    text.push_str(&format!("    step_{} -> exit;\n}}\n", steps - 1));
    text
}

fn bench_parse(c: &mut Criterion) {
    let text = pipeline_text(50);
    c.bench_function("parse_50_node_graph", |b| {
        b.iter(|| Graph::parse(black_box(&text)).unwrap())
    });
}

fn bench_condition(c: &mut Criterion) {
    let context = Context::new();
    context.set("phase", "review");
    context.set("count", 7);
    let mut graph_attrs = HashMap::new();
    graph_attrs.insert("goal".to_string(), AttrValue::Str("benchmark".to_string()));
    c.bench_function("evaluate_guard", |b| {
        b.iter(|| {
            evaluate_condition(
                black_box(Some(
                    "context.phase == 'review' && context.count * 2 >= 10 || graph.goal == ''",
                )),
                &context,
                &graph_attrs,
            )
        })
    });
}

criterion_group!(benches, bench_parse, bench_condition);
criterion_main!(benches);
