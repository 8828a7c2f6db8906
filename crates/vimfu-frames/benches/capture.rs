use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vimfu_core::Dimensions;
use vimfu_emulator::{Grid, Parser, ScreenSnapshot};
use vimfu_frames::{capture_frame, ActionDescriptor, SessionDocument};

/// A screen resembling vim with syntax highlighting and a status line
fn create_editor_snapshot(rows: u16, cols: u16) -> ScreenSnapshot {
    let mut parser = Parser::new(Grid::new(Dimensions::new(rows, cols)));

    for i in 0..rows.saturating_sub(2) {
        let line = format!(
            "\x1b[33m{:>3} \x1b[0m\x1b[1;34mfn\x1b[0m \x1b[32mstep_{}\x1b[0m(\x1b[38;5;208mx\x1b[0m: u32) {{ \x1b[38;2;200;120;80m// line {}\x1b[0m\r\n",
            i + 1,
            i,
            i
        );
        parser.process(line.as_bytes());
    }
    parser.process(b"\x1b[7m demo.rs [+]                      1,1  Top \x1b[0m\r\n-- INSERT --");

    ScreenSnapshot::from_grid(parser.grid(), 0)
}

fn bench_capture_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture_frame");

    for size in [(24, 80), (40, 120), (60, 200)].iter() {
        let (rows, cols) = *size;
        let snapshot = create_editor_snapshot(rows, cols);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", rows, cols)),
            &snapshot,
            |b, snapshot| b.iter(|| capture_frame(black_box(snapshot))),
        );
    }

    group.finish();
}

fn bench_dedup(c: &mut Criterion) {
    let snapshot = create_editor_snapshot(24, 80);
    let frame = capture_frame(&snapshot);

    c.bench_function("dedup_500_identical", |b| {
        b.iter(|| {
            let mut doc = SessionDocument::new("bench", "", 24, 80);
            for i in 0..500u64 {
                doc.push(frame.clone(), i, ActionDescriptor::new("keys", "j"));
            }
            black_box(doc.dedup())
        })
    });
}

criterion_group!(benches, bench_capture_frame, bench_dedup);
criterion_main!(benches);
