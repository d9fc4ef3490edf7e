use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use relaychat::client::{FrameDecoder, FrameMode};
use relaychat::server::framing::encode_frame;
use relaychat::ui::format::format_message;

fn make_body(fragments: usize, fragment: &str) -> Vec<u8> {
    (0..fragments)
        .map(|_| encode_frame(fragment))
        .collect::<String>()
        .into_bytes()
}

fn decode(mode: FrameMode, body: &[u8], read_size: usize) -> usize {
    let mut decoder = FrameDecoder::new(mode);
    let mut total = 0;
    for read in body.chunks(read_size) {
        for chunk in decoder.push(read).unwrap_or_default() {
            total += chunk.len();
        }
    }
    total + decoder.finish().unwrap_or_default().len()
}

fn bench_frame_decode(c: &mut Criterion) {
    let fragment = "lorem ipsum dolor sit amet, **consectetur** adipiscing elit\n* sed do eiusmod";

    for &fragments in &[100usize, 1000usize] {
        let body = make_body(fragments, fragment);
        let mut group = c.benchmark_group(format!("frame_decode_{fragments}"));
        group.throughput(Throughput::Bytes(body.len() as u64));

        // Small reads split frames (and characters) across pushes.
        for &read_size in &[7usize, 4096usize] {
            group.bench_function(BenchmarkId::new("events", read_size), |b| {
                b.iter(|| decode(FrameMode::Events, &body, read_size))
            });
            group.bench_function(BenchmarkId::new("legacy", read_size), |b| {
                b.iter(|| decode(FrameMode::Legacy, &body, read_size))
            });
        }
        group.finish();
    }
}

fn bench_format_message(c: &mut Criterion) {
    let line = "* **bold** item with `code` and more text\n```int x = 1;```\nplain line\n";
    let mut group = c.benchmark_group("format_message");

    for &lines in &[50usize, 500usize] {
        let text = line.repeat(lines);
        group.throughput(Throughput::Elements(lines as u64 * 3));
        group.bench_function(BenchmarkId::from_parameter(lines), |b| {
            b.iter(|| format_message(&text))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frame_decode, bench_format_message);
criterion_main!(benches);
