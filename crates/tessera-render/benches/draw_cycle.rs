use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use tessera_core::ComposeConfig;
use tessera_core::geom::BBox;
use tessera_render::labels::{Label, resolve};
use tessera_render::{Compose, LayoutSource};

fn dashboard() -> LayoutSource {
    LayoutSource::json(|data| {
        json!([
            {"type": "Title", "id": "title", "text": "Throughput"},
            [
                {"type": "Title", "id": "y-title", "text": "req/s"},
                {"_layered": true, "items": [
                    {"type": "Bars", "id": "bars", "data": data["series"].clone()},
                    {"type": "Labels", "id": "labels", "data": data["series"].clone()}
                ]},
                {"type": "Legend", "id": "legend", "data": ["p50", "p90", "p99"]}
            ],
            {"type": "Text", "id": "footer", "text": "last 24h"}
        ])
    })
}

fn series(n: usize) -> serde_json::Value {
    let series: Vec<Vec<f64>> = (0..3)
        .map(|s| (0..n).map(|i| ((i * 7 + s * 13) % 50) as f64 + 1.0).collect())
        .collect();
    json!({"series": series})
}

fn bench_draw_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_cycle");
    group.sample_size(50);

    let data = series(24);
    group.bench_function("first_draw_24x3", |b| {
        b.iter(|| {
            let mut compose = Compose::new(dashboard())
                .with_config(ComposeConfig::default().with_size(800.0, 400.0));
            compose.draw(black_box(data.clone())).expect("draw");
            black_box(compose.chart_position());
        });
    });

    // Redraws go through reconciliation with every item kept.
    let mut compose = Compose::new(dashboard())
        .with_config(ComposeConfig::default().with_size(800.0, 400.0));
    compose.draw(data.clone()).expect("draw");
    group.bench_function("redraw_24x3", |b| {
        b.iter(|| {
            compose.redraw().expect("redraw");
            black_box(compose.chart_position());
        });
    });

    group.finish();
}

fn bench_label_collisions(c: &mut Criterion) {
    let labels: Vec<Vec<Label>> = (0..4)
        .map(|s| {
            (0..100)
                .map(|i| {
                    let x = i as f64 * 12.0;
                    let y = ((i * 31 + s * 17) % 40) as f64;
                    Label::new(BBox::new(x, y, 20.0, 12.0))
                })
                .collect()
        })
        .collect();

    c.bench_function("label_collisions_4x100", |b| {
        b.iter(|| {
            let mut labels = labels.clone();
            black_box(resolve(black_box(&mut labels)));
        });
    });
}

criterion_group!(benches, bench_draw_cycle, bench_label_collisions);
criterion_main!(benches);
