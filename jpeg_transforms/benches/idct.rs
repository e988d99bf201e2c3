// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use jpeg_transforms::{BLOCK_DIM, BLOCK_SIZE, idct8x8};
use std::hint::black_box;

fn bench_idct8x8(c: &mut Criterion) {
    let mut group = c.benchmark_group("idct8x8");

    let mut dc_only = [0i16; BLOCK_SIZE];
    dc_only[0] = 120;
    let dense: [i16; BLOCK_SIZE] = std::array::from_fn(|i| ((i as i16 * 37) % 61) - 30);

    for (name, block) in [("dc_only", dc_only), ("dense", dense)] {
        let mut out = [0u8; BLOCK_SIZE];
        group.bench_function(BenchmarkId::new("block", name), |b| {
            b.iter(|| idct8x8(black_box(&block), &mut out, BLOCK_DIM))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_idct8x8);
criterion_main!(benches);
