#[path = "../util/util.rs"]
mod util;

use util::bench_images;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use image::RgbImage;
use swatch::{kmeans, summarize, ColorSlice, IndexedColorCounts, KmeansOptions, PaletteSize};

fn bench(
    c: &mut Criterion,
    group: &str,
    mut f: impl FnMut(&mut Bencher<WallTime>, &(PaletteSize, &RgbImage)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (k, secs) in [(32.into(), 4), (16.into(), 3), (8.into(), 2), (PaletteSize::DEFAULT, 2)] {
        group.measurement_time(Duration::from_secs(secs));
        for (name, image) in bench_images() {
            group.bench_with_input(BenchmarkId::new(k.to_string(), name), &(k, image), &mut f);
        }
    }
}

// Images may have fewer distinct colors than clusters.
const OPTIONS: KmeansOptions = KmeansOptions::new().keep_empty_clusters(true);

fn kmeans_dedup_single(c: &mut Criterion) {
    bench(c, "kmeans_dedup_single", |b, &(k, image)| {
        let counts = IndexedColorCounts::try_from_rgbimage(image).unwrap();
        b.iter(|| kmeans::cluster_color_counts(&counts, k, &OPTIONS).unwrap())
    })
}

fn kmeans_dedup_par(c: &mut Criterion) {
    bench(c, "kmeans_dedup_par", |b, &(k, image)| {
        let counts = IndexedColorCounts::try_from_rgbimage_par(image).unwrap();
        b.iter(|| kmeans::cluster_color_counts_par(&counts, k, &OPTIONS).unwrap())
    })
}

fn kmeans_pixels_par(c: &mut Criterion) {
    bench(c, "kmeans_pixels_par", |b, &(k, image)| {
        let slice = ColorSlice::try_from(image).unwrap();
        let options = OPTIONS.dedup_pixels(false).max_iterations(20);
        b.iter(|| kmeans::cluster_par(slice, k, &options).unwrap())
    })
}

fn summarize_single(c: &mut Criterion) {
    bench(c, "summarize_single", |b, &(k, image)| {
        let slice = ColorSlice::try_from(image).unwrap();
        let clustering = kmeans::cluster_par(slice, k, &OPTIONS).unwrap();
        b.iter(|| summarize(&clustering.centroids, &clustering.assignment).unwrap())
    })
}

criterion_group!(
    benches,
    kmeans_dedup_single,
    kmeans_dedup_par,
    kmeans_pixels_par,
    summarize_single,
);
criterion_main!(benches);
