use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8_vm::prelude::*;

const MAZE: &[u8] = include_bytes!("../tests/maze.rom");

fn criterion_benchmark(c: &mut Criterion) {
    {
        let conf = Chip8Conf {
            seed: Some(1),
            ..Default::default()
        };
        let mut vm = Chip8Vm::with_bytecode(conf, MAZE).unwrap();
        let mut devices = Headless::new();

        c.bench_function("maze bytecode", |b| {
            b.iter(|| {
                let step_count = black_box(1000_usize);
                black_box(vm.run_steps(&mut devices, step_count).unwrap())
            })
        });
    }

    c.bench_function("decode", |b| {
        b.iter(|| {
            for word in 0..=u16::MAX {
                black_box(Instr::decode(black_box(word)));
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
