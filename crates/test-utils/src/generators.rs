//! Test data generators for synthetic tracks and map tiles.
//!
//! These generators create predictable, verifiable test data that can be
//! used across the test suite.

use flate2::write::GzEncoder;
use flate2::Compression;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

/// Builds a GPX 1.1 document with a single track segment.
///
/// When `time` is given it is written as the metadata time and as the time
/// of every point.
///
/// # Example
///
/// ```
/// use test_utils::gpx_document;
///
/// let gpx = gpx_document(&[(45.0, 7.0)], Some("2021-06-01T08:00:00Z"));
/// assert!(gpx.contains(r#"<trkpt lat="45" lon="7">"#));
/// ```
pub fn gpx_document(points: &[(f64, f64)], time: Option<&str>) -> String {
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <gpx version=\"1.1\" creator=\"test-utils\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n",
    );
    if let Some(t) = time {
        doc.push_str(&format!("  <metadata><time>{}</time></metadata>\n", t));
    }
    doc.push_str("  <trk>\n    <trkseg>\n");
    for (lat, lon) in points {
        doc.push_str(&format!("      <trkpt lat=\"{}\" lon=\"{}\">", lat, lon));
        if let Some(t) = time {
            doc.push_str(&format!("<time>{}</time>", t));
        }
        doc.push_str("</trkpt>\n");
    }
    doc.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    doc
}

/// Writes a GPX document into `dir/name` and returns its path.
pub fn write_gpx(dir: &Path, name: &str, points: &[(f64, f64)], time: Option<&str>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, gpx_document(points, time)).expect("write gpx fixture");
    path
}

/// Writes a gzip-compressed GPX document into `dir/name`.
pub fn write_gzipped_gpx(
    dir: &Path,
    name: &str,
    points: &[(f64, f64)],
    time: Option<&str>,
) -> PathBuf {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(gpx_document(points, time).as_bytes())
        .expect("compress gpx fixture");
    let bytes = encoder.finish().expect("finish gzip stream");

    let path = dir.join(name);
    fs::write(&path, bytes).expect("write gzipped gpx fixture");
    path
}

/// Creates a straight line of `count` points starting at `start`, each
/// offset by `step` degrees in both latitude and longitude.
pub fn track_line(start: (f64, f64), step: f64, count: usize) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| (start.0 + step * i as f64, start.1 + step * i as f64))
        .collect()
}

/// Encodes a solid-color square PNG, like a blank map tile.
pub fn solid_png_tile(size: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(size, size, Rgb(rgb));
    encode_png(DynamicImage::ImageRgb8(img))
}

/// Encodes a tile whose left half is `left` and right half is `right`.
pub fn split_png_tile(size: u32, left: [u8; 3], right: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_fn(size, size, |x, _| {
        if x < size / 2 {
            Rgb(left)
        } else {
            Rgb(right)
        }
    });
    encode_png(DynamicImage::ImageRgb8(img))
}

fn encode_png(img: DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Png)
        .expect("encode png fixture");
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpx_document_lists_points() {
        let gpx = gpx_document(&[(45.0, 7.0), (45.5, 7.25)], None);
        assert_eq!(gpx.matches("<trkpt").count(), 2);
        assert!(gpx.contains(r#"lat="45.5" lon="7.25""#));
        assert!(!gpx.contains("<time>"));
    }

    #[test]
    fn test_track_line() {
        let line = track_line((10.0, 20.0), 0.5, 3);
        assert_eq!(line, vec![(10.0, 20.0), (10.5, 20.5), (11.0, 21.0)]);
    }

    #[test]
    fn test_solid_tile_is_png() {
        let bytes = solid_png_tile(8, [10, 20, 30]);
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_write_gzipped_gpx_has_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gzipped_gpx(dir.path(), "a.gpx.gz", &[(1.0, 2.0)], None);
        let bytes = fs::read(path).unwrap();
        assert_eq!(&bytes[0..2], &[0x1f, 0x8b]);
    }
}
