//! Benchmarks for parsing, selection, and mutation.
//!
//! Run with: cargo bench

use std::cell::Cell;
use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};

use itsy::{Document, Event};

/// A flat list document with a few hundred items to select over.
fn sample_markup(items: usize) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html><html><head><title>bench</title></head><body><ul id="menu">"#,
    );
    for i in 0..items {
        let parity = if i % 2 == 0 { "even" } else { "odd" };
        html.push_str(&format!(
            r#"<li class="item {parity}"><span>entry {i}</span></li>"#
        ));
    }
    html.push_str("</ul></body></html>");
    html
}

/// A deeply nested document for event propagation.
fn nested_markup(depth: usize) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head></head><body>");
    for _ in 0..depth {
        html.push_str("<div>");
    }
    html.push_str("<button>go</button>");
    for _ in 0..depth {
        html.push_str("</div>");
    }
    html.push_str("</body></html>");
    html
}

// ============================================================================
// Parsing and Serialization Benchmarks
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let html = sample_markup(200);

    c.bench_function("parse", |b| {
        b.iter(|| Document::parse(&html));
    });
}

fn bench_serialize(c: &mut Criterion) {
    let doc = Document::parse(&sample_markup(200));

    c.bench_function("serialize", |b| {
        b.iter(|| doc.to_html());
    });
}

// ============================================================================
// Selection Benchmarks
// ============================================================================

fn bench_select_by_tag(c: &mut Criterion) {
    let doc = Document::parse(&sample_markup(200));

    c.bench_function("select_by_tag", |b| {
        b.iter(|| doc.select("li").unwrap().len());
    });
}

fn bench_select_by_class(c: &mut Criterion) {
    let doc = Document::parse(&sample_markup(200));

    c.bench_function("select_by_class", |b| {
        b.iter(|| doc.select(".odd").unwrap().len());
    });
}

fn bench_select_descendant(c: &mut Criterion) {
    let doc = Document::parse(&sample_markup(200));

    c.bench_function("select_descendant", |b| {
        b.iter(|| doc.select("#menu li.even span").unwrap().len());
    });
}

// ============================================================================
// Mutation Benchmarks
// ============================================================================

fn bench_toggle_classes(c: &mut Criterion) {
    let doc = Document::parse(&sample_markup(200));
    let items = doc.select("li").unwrap();

    c.bench_function("toggle_classes", |b| {
        b.iter(|| {
            items.add_class("hot").remove_class("hot");
        });
    });
}

fn bench_style(c: &mut Criterion) {
    let doc = Document::parse(&sample_markup(200));
    let items = doc.select("li").unwrap();

    c.bench_function("style", |b| {
        b.iter(|| {
            items.style(&[("color", "red"), ("margin", "0")]);
        });
    });
}

// ============================================================================
// Event Dispatch Benchmarks
// ============================================================================

fn bench_dispatch_through_ancestors(c: &mut Criterion) {
    let doc = Document::parse(&nested_markup(32));
    let button = doc.select("button").unwrap();
    let outermost = doc.select("body > div").unwrap();

    let count = Rc::new(Cell::new(0u64));
    let seen = count.clone();
    outermost.on("press", move |_event: &Event| seen.set(seen.get() + 1));

    let target = button.first().unwrap();
    c.bench_function("dispatch_through_ancestors", |b| {
        b.iter(|| doc.dispatch(target, "press"));
    });
}

criterion_group!(
    benches,
    // Parsing and serialization
    bench_parse,
    bench_serialize,
    // Selection
    bench_select_by_tag,
    bench_select_by_class,
    bench_select_descendant,
    // Mutation
    bench_toggle_classes,
    bench_style,
    // Events
    bench_dispatch_through_ancestors,
);
criterion_main!(benches);
