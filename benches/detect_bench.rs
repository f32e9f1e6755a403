use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dset::detect;
use dset::dsio::all_rows;
use dset::{DataFormat, Structure};

fn sample_csv(rows: usize) -> Vec<u8> {
    let mut out = String::from("id,name,score,active,joined\n");
    for i in 0..rows {
        out.push_str(&format!("{i},user{i},{}.25,{},2020-01-{:02}\n", i % 100, i % 2 == 0, i % 28 + 1));
    }
    out.into_bytes()
}

fn bench_detect(c: &mut Criterion) {
    let data = sample_csv(5000);
    let st = Structure::new(DataFormat::Csv);

    c.bench_function("detect_csv_5000_rows", |b| {
        b.iter(|| detect::fields(black_box(&st), black_box(&data[..])).unwrap())
    });
}

fn bench_hash_and_read(c: &mut Criterion) {
    let data = sample_csv(5000);
    let st = detect::structure(&Structure::new(DataFormat::Csv), &data[..]).unwrap();

    c.bench_function("structure_hash", |b| b.iter(|| black_box(&st).hash().unwrap()));
    c.bench_function("read_all_rows_5000", |b| {
        b.iter(|| all_rows(black_box(&st), black_box(&data)).unwrap())
    });
}

criterion_group!(benches, bench_detect, bench_hash_and_read);
criterion_main!(benches);
