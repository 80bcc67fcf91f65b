//! Writing rendered heatmaps to disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use heatmap_common::HeatmapResult;
use renderer::png::encode_rgb_png;
use renderer::RgbRaster;
use tracing::info;

use crate::pipeline::{DensityCell, HeatmapOutput};

/// The image path with its extension forced to `.png`.
pub fn png_output_path(path: &Path) -> PathBuf {
    path.with_extension("png")
}

/// CSV file written next to the image: `<stem>.csv`.
pub fn csv_output_path(png_path: &Path) -> PathBuf {
    png_path.with_extension("csv")
}

pub fn write_png(path: &Path, image: &RgbRaster) -> HeatmapResult<()> {
    let bytes = encode_rgb_png(image)?;
    std::fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "Saved heatmap image");
    Ok(())
}

/// Write `lat,lon,intensity` rows. Returns the number of rows written.
pub fn write_csv<W, I>(writer: W, cells: I) -> HeatmapResult<usize>
where
    W: Write,
    I: IntoIterator<Item = DensityCell>,
{
    let mut writer = BufWriter::new(writer);
    writeln!(writer, "lat,lon,intensity")?;

    let mut rows = 0;
    for cell in cells {
        writeln!(writer, "{},{},{}", cell.lat, cell.lon, cell.intensity)?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

/// Export every cell above `threshold` to a CSV file.
pub fn write_csv_file(path: &Path, output: &HeatmapOutput, threshold: f64) -> HeatmapResult<usize> {
    let file = File::create(path)?;
    let rows = write_csv(file, output.visible_cells(threshold))?;
    info!(path = %path.display(), rows = rows, "Saved density CSV");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_extension_forced() {
        assert_eq!(png_output_path(Path::new("out/heat.jpg")), PathBuf::from("out/heat.png"));
        assert_eq!(png_output_path(Path::new("heatmap")), PathBuf::from("heatmap.png"));
        assert_eq!(png_output_path(Path::new("heatmap.png")), PathBuf::from("heatmap.png"));
    }

    #[test]
    fn test_csv_next_to_png() {
        assert_eq!(csv_output_path(Path::new("out/heat.png")), PathBuf::from("out/heat.csv"));
    }

    #[test]
    fn test_write_csv_rows() {
        let cells = vec![
            DensityCell {
                lat: 45.5,
                lon: 7.25,
                intensity: 1.0,
            },
            DensityCell {
                lat: -1.0,
                lon: 0.5,
                intensity: 0.125,
            },
        ];
        let mut buf = Vec::new();
        let rows = write_csv(&mut buf, cells).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "lat,lon,intensity\n45.5,7.25,1\n-1,0.5,0.125\n"
        );
    }

    #[test]
    fn test_write_csv_header_only() {
        let mut buf = Vec::new();
        assert_eq!(write_csv(&mut buf, Vec::new()).unwrap(), 0);
        assert_eq!(buf, b"lat,lon,intensity\n");
    }
}
