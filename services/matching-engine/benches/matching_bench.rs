use claims_matching_engine::{EngineConfig, MatchingEngine, OrderBook, RecordingSettlement};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use types::ids::{AccountId, OrderIdAllocator, TradingPair};
use types::numeric::{Amount, Price};
use types::order::Side;

struct Fixture {
    engine: MatchingEngine,
    book: OrderBook,
    ids: OrderIdAllocator,
    settlement: RecordingSettlement,
    maker: AccountId,
    taker: AccountId,
}

impl Fixture {
    fn new() -> Self {
        Self {
            engine: MatchingEngine::new(EngineConfig::default()).unwrap(),
            book: OrderBook::new(TradingPair::new("FLOOD-2025", "USDC").unwrap()),
            ids: OrderIdAllocator::default(),
            settlement: RecordingSettlement::default(),
            maker: AccountId::new(),
            taker: AccountId::new(),
        }
    }

    fn place(&mut self, trader: AccountId, side: Side, amount: u128, price: u64) {
        self.engine
            .place_limit(
                &mut self.book,
                &mut self.settlement,
                &self.ids,
                trader,
                side,
                Amount::new(amount),
                Price::from_units(price),
            )
            .unwrap();
    }
}

fn bench_simple_match(c: &mut Criterion) {
    c.bench_function("simple_full_match", |b| {
        b.iter_batched(
            || {
                let mut f = Fixture::new();
                f.place(f.maker, Side::Sell, 10, 100);
                f
            },
            |mut f| {
                f.place(f.taker, Side::Buy, 10, 100);
                black_box(f.book.resting_count())
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_one_to_many_match(c: &mut Criterion) {
    c.bench_function("one_to_many_match", |b| {
        b.iter_batched(
            || {
                let mut f = Fixture::new();
                for _ in 0..10 {
                    f.place(f.maker, Side::Sell, 1, 100);
                }
                f
            },
            |mut f| {
                f.place(f.taker, Side::Buy, 10, 100);
                black_box(f.book.resting_count())
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_deep_book_sweep(c: &mut Criterion) {
    c.bench_function("deep_book_sweep", |b| {
        b.iter_batched(
            || {
                let mut f = Fixture::new();
                // 1000 bids and 1000 asks across 100 levels each
                for i in 0..1000u64 {
                    f.place(f.maker, Side::Buy, 1, 1_000 - i % 100);
                    f.place(f.maker, Side::Sell, 1, 1_001 + i % 100);
                }
                f
            },
            |mut f| {
                f.place(f.taker, Side::Buy, 500, 1_100);
                black_box(f.book.resting_count())
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_resting_insert(c: &mut Criterion) {
    let mut f = Fixture::new();
    let mut i = 0u64;
    c.bench_function("resting_insert", |b| {
        b.iter(|| {
            i += 1;
            f.place(f.maker, Side::Buy, 1, 1 + i % 500);
        });
    });
}

criterion_group!(
    benches,
    bench_simple_match,
    bench_one_to_many_match,
    bench_deep_book_sweep,
    bench_resting_insert
);
criterion_main!(benches);
