use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sb_core::{ExperienceTable, build_experience_table};

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_experience_table", |b| {
        b.iter(|| black_box(build_experience_table()))
    });
}

fn bench_level_lookup(c: &mut Criterion) {
    let table = ExperienceTable::standard();
    c.bench_function("level_for_experience", |b| {
        b.iter(|| {
            for xp in (0..13_034_394u64).step_by(104_729) {
                black_box(table.level_for(black_box(xp)));
            }
        })
    });
}

criterion_group!(benches, bench_build, bench_level_lookup);
criterion_main!(benches);
