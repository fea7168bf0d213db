//! Performance benchmarks for Tilawa Gateway
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;
use tilawa_gateway::core::alignment::{AlignmentEngine, RecognizedWord};
use tilawa_gateway::core::corpus::{TargetWindow, VerseCorpus};
use tilawa_gateway::core::matcher::match_verses;
use tilawa_gateway::core::text::normalize;
use tilawa_gateway::core::tracking::PcmRingBuffer;
use tilawa_gateway::handlers::live::messages::LiveIncomingMessage;

const VERSES: [&str; 7] = [
    "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ",
    "الْحَمْدُ لِلَّهِ رَبِّ الْعَالَمِينَ",
    "الرَّحْمَٰنِ الرَّحِيمِ",
    "مَالِكِ يَوْمِ الدِّينِ",
    "إِيَّاكَ نَعْبُدُ وَإِيَّاكَ نَسْتَعِينُ",
    "اهْدِنَا الصِّرَاطَ الْمُسْتَقِيمَ",
    "صِرَاطَ الَّذِينَ أَنْعَمْتَ عَلَيْهِمْ غَيْرِ الْمَغْضُوبِ عَلَيْهِمْ وَلَا الضَّالِّينَ",
];

/// Corpus of roughly the real size (6236 verses) built from repeated text.
fn synthetic_corpus() -> VerseCorpus {
    let mut source = String::new();
    for surah_no in 1..=114u16 {
        for ayah_no in 1..=55u16 {
            let text = VERSES[(surah_no as usize + ayah_no as usize) % VERSES.len()];
            source.push_str(&format!("{surah_no}|{ayah_no}|{text}\n"));
        }
    }
    VerseCorpus::parse(&source).expect("synthetic corpus parses")
}

fn recognized(words: &[String]) -> Vec<RecognizedWord> {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| RecognizedWord {
            text: w.clone(),
            raw: w.clone(),
            start_ms: i as f64 * 400.0,
            end_ms: (i + 1) as f64 * 400.0,
        })
        .collect()
}

/// Benchmark Arabic normalization
fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let long = VERSES.join(" ").repeat(10);
    group.throughput(Throughput::Bytes(long.len() as u64));
    group.bench_function("long_passage", |b| {
        b.iter(|| normalize(black_box(&long)));
    });

    group.bench_function("single_verse", |b| {
        b.iter(|| normalize(black_box(VERSES[6])));
    });

    group.finish();
}

/// Benchmark the full-corpus verse scan used for anchoring
fn bench_match_verses(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_verses");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let corpus = synthetic_corpus();
    for transcript in ["مالك يوم الدين", "صراط الذين انعمت عليهم غير المغضوب عليهم"] {
        let transcript = normalize(transcript);
        group.bench_with_input(
            BenchmarkId::new("top3", transcript.chars().count()),
            &transcript,
            |b, t| {
                b.iter(|| match_verses(black_box(t), &corpus, 3));
            },
        );
    }

    group.finish();
}

/// Benchmark word alignment at live-session sizes
fn bench_alignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("alignment");

    let corpus = synthetic_corpus();
    let engine = AlignmentEngine::default();

    for verses in [12usize, 50] {
        let window = corpus.window(1, 1, verses).expect("anchor exists");
        let target = TargetWindow::from_verses(window);
        // a recitation covering the first half of the window with one word skipped
        let words: Vec<String> = target
            .words
            .iter()
            .take(target.words.len() / 2)
            .enumerate()
            .filter(|(i, _)| i % 7 != 3)
            .map(|(_, w)| w.text.clone())
            .collect();
        let history = recognized(&words);

        group.throughput(Throughput::Elements((history.len() * target.words.len()) as u64));
        group.bench_with_input(
            BenchmarkId::new("cells", history.len() * target.words.len()),
            &(history, target),
            |b, (history, target)| {
                b.iter(|| engine.align(black_box(history), black_box(&target.words)));
            },
        );
    }

    group.finish();
}

/// Benchmark PCM ingest into the session ring buffer
fn bench_ring_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");

    // 100 ms of 16 kHz PCM16
    let frame = vec![0u8; 3_200];
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("push_bytes_100ms", |b| {
        let mut buffer = PcmRingBuffer::new(45 * 16_000);
        b.iter(|| buffer.push_bytes(black_box(&frame)));
    });

    group.bench_function("latest_14s", |b| {
        let mut buffer = PcmRingBuffer::new(45 * 16_000);
        buffer.push_samples(&vec![1; 45 * 16_000]);
        b.iter(|| buffer.latest(black_box(14 * 16_000)));
    });

    group.finish();
}

/// Benchmark client message parsing
fn bench_message_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_parsing");

    let start = r#"{"type":"start","sample_rate":16000,"window_sec":14,"target_ayahs":12}"#;
    let audio = format!(r#"{{"type":"audio","data":"{}"}}"#, "AAAA".repeat(10_000));

    for (name, msg) in [("start", start.to_string()), ("audio_40k", audio)] {
        group.throughput(Throughput::Bytes(msg.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, msg.len()), &msg, |b, msg| {
            b.iter(|| {
                let _: Result<LiveIncomingMessage, _> = serde_json::from_str(black_box(msg));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_normalize,
    bench_match_verses,
    bench_alignment,
    bench_ring_buffer,
    bench_message_parsing,
);

criterion_main!(benches);
