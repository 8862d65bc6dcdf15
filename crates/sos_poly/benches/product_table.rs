use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sos_poly::{MonomialBasis, ProductTable};

fn bench_product_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("product_table");
    for &(nvars, degree) in &[(2usize, 6u32), (3, 5), (4, 4)] {
        let basis = MonomialBasis::generate(nvars, degree);
        group.bench_function(format!("build_n{}_d{}", nvars, degree), |b| {
            b.iter(|| ProductTable::build(black_box(&basis)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_product_table);
criterion_main!(benches);
