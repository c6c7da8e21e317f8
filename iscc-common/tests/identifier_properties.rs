//! Identifier properties over the public API

use std::io::Cursor;

use image::{ImageBuffer, ImageFormat, Rgb};
use iscc_common::codec::decompose;
use iscc_common::config::UnitBits;
use iscc_common::{compose, compute_unit, ByteSource, UnitKind, UnitPool};

fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, shade, (y * 255 / height) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

#[tokio::test]
async fn test_same_bytes_same_identifier() {
    let bytes = png(50, 40, 12);
    let pool = UnitPool::standard(3, UnitBits::default());

    let first = pool.identify(&ByteSource::new(bytes.clone())).await.unwrap();
    let second = pool.identify(&ByteSource::new(bytes)).await.unwrap();
    assert_eq!(first.value(), second.value());
}

#[tokio::test]
async fn test_different_bytes_different_identifier() {
    let pool = UnitPool::standard(3, UnitBits::default());

    let a = pool.identify(&ByteSource::new(png(50, 40, 12))).await.unwrap();
    let b = pool.identify(&ByteSource::new(png(50, 40, 13))).await.unwrap();
    assert_ne!(a.value(), b.value());
    assert_ne!(a.constituents().instance, b.constituents().instance);
}

#[test]
fn test_computed_composite_decomposes() {
    let source = ByteSource::new(png(30, 30, 200));
    let units: Vec<_> = UnitKind::ALL
        .iter()
        .map(|kind| compute_unit(*kind, &source, 128).unwrap())
        .collect();

    let composite = compose(&units[0], &units[1], &units[2]);
    assert_eq!(decompose(composite.value()).unwrap(), units);
    assert_ne!(
        composite.value(),
        compose(&units[1], &units[0], &units[2]).value()
    );
}
