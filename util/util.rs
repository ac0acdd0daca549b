#![allow(dead_code)]

use std::sync::OnceLock;

use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// A smooth gradient with a small amount of noise, like a photo of a sky or a wall.
fn gradient(width: u32, height: u32, rng: &mut Xoroshiro128PlusPlus) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        #[allow(clippy::cast_possible_truncation)]
        let channel = |pos: u32, len: u32| (pos * 255 / len.max(1)) as u8;
        let noise = rng.gen_range(0..8);
        Rgb([
            channel(x, width).saturating_add(noise),
            channel(y, height).saturating_add(noise),
            128u8.saturating_add(noise),
        ])
    })
}

/// Rectangular patches of a few flat colors, like a poster or a screenshot.
fn patches(width: u32, height: u32, rng: &mut Xoroshiro128PlusPlus) -> RgbImage {
    let colors = (0..12)
        .map(|_| Rgb([rng.gen(), rng.gen(), rng.gen()]))
        .collect::<Vec<_>>();

    RgbImage::from_fn(width, height, |x, y| {
        colors[((x / 64 + y / 48 * 7) as usize) % colors.len()]
    })
}

/// Uniform random pixels, the worst case for deduplication.
fn noise(width: u32, height: u32, rng: &mut Xoroshiro128PlusPlus) -> RgbImage {
    RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
}

pub fn generate_images() -> Vec<(String, RgbImage)> {
    const WIDTH: u32 = 1920;
    const HEIGHT: u32 = 1080;

    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(0);
    vec![
        ("gradient".to_owned(), gradient(WIDTH, HEIGHT, &mut rng)),
        ("patches".to_owned(), patches(WIDTH, HEIGHT, &mut rng)),
        ("noise".to_owned(), noise(WIDTH, HEIGHT, &mut rng)),
    ]
}

static BENCH_IMAGES: OnceLock<Vec<(String, RgbImage)>> = OnceLock::new();

pub fn bench_images() -> &'static [(String, RgbImage)] {
    BENCH_IMAGES.get_or_init(generate_images)
}
