//! Разбор идентификаторов мест и расчёт цены на горячем пути покупки.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use seat_reservation::models::{SeatId, Venue};

fn layout(sections: u32) -> String {
    let sections: Vec<String> = (0..sections)
        .map(|i| {
            format!(
                r#"{{"id": "s{i}", "name": "Section {i}", "price": {}, "row_start": {}, "row_end": {}, "col_start": 0, "col_end": 49}}"#,
                100 + i,
                i * 2,
                i * 2 + 1,
            )
        })
        .collect();
    format!(r#"{{"sections": [{}]}}"#, sections.join(","))
}

fn bench_seat_id_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("seat_id_parse");
    for raw in ["r1-c1", "r1234-c5678", "r01-c1", "garbage"] {
        group.bench_with_input(BenchmarkId::from_parameter(raw), raw, |b, raw| {
            b.iter(|| black_box(SeatId::parse(black_box(raw))).is_ok())
        });
    }
    group.finish();
}

fn bench_price_for(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_for");
    for sections in [1u32, 10, 100] {
        let venue = Venue::from_bytes(layout(sections), 100).unwrap();
        // Последняя секция и место вне всех секций: худший случай линейного поиска
        let last = SeatId::new(sections * 2 - 1, 10);
        let outside = SeatId::new(sections * 2 + 5, 10);

        group.bench_with_input(BenchmarkId::new("last_section", sections), &last, |b, seat| {
            b.iter(|| black_box(venue.price_for(black_box(seat))))
        });
        group.bench_with_input(BenchmarkId::new("default_price", sections), &outside, |b, seat| {
            b.iter(|| black_box(venue.price_for(black_box(seat))))
        });
    }
    group.finish();
}

criterion_group!(pricing_benches, bench_seat_id_parse, bench_price_for);
criterion_main!(pricing_benches);
