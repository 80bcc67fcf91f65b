//! Common test fixtures for heatmap tests.
//!
//! This module provides pre-defined inputs that represent common
//! scenarios in track processing and rendering.

/// Short track segments as `(lat, lon)` pairs.
pub mod tracks {
    /// Three points about 100 m apart, all in tile 14/8510/5893.
    pub const ALPINE_WALK: [(f64, f64); 3] = [(45.0, 7.0), (45.001, 7.001), (45.002, 7.002)];

    /// A few points around Manhattan, straddling the row 384/385 boundary
    /// at zoom 10.
    pub const MANHATTAN: [(f64, f64); 4] = [
        (40.7128, -74.0060),
        (40.7138, -74.0050),
        (40.7148, -74.0040),
        (40.7158, -74.0030),
    ];

    /// Points beyond the Web Mercator latitude band.
    pub const POLAR: [(f64, f64); 2] = [(86.0, 10.0), (-89.0, -20.0)];
}

/// Bounding boxes as `(lat_min, lat_max, lon_min, lon_max)`.
pub mod bounds {
    /// Whole world (the CLI default)
    pub const WORLD: (f64, f64, f64, f64) = (-90.0, 90.0, -180.0, 180.0);

    /// Box around the alpine walk
    pub const ALPS: (f64, f64, f64, f64) = (44.9, 45.1, 6.9, 7.1);

    /// Box containing none of the fixture tracks
    pub const SOUTH_ATLANTIC: (f64, f64, f64, f64) = (-40.0, -30.0, -20.0, -10.0);
}

/// Raw GPX documents for parser edge cases.
pub mod gpx {
    /// Track with two points and a 2021 timestamp.
    pub const TWO_POINTS_2021: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="fixture" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata><time>2021-06-01T08:00:00Z</time></metadata>
  <trk>
    <name>Morning Run</name>
    <trkseg>
      <trkpt lat="45.0" lon="7.0"><ele>500</ele><time>2021-06-01T08:00:00Z</time></trkpt>
      <trkpt lat="45.001" lon="7.001"><ele>501</ele><time>2021-06-01T08:00:05Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>
"#;

    /// Valid document without any track points.
    pub const EMPTY_TRACK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="fixture"><trk><trkseg></trkseg></trk></gpx>
"#;

    /// Truncated document.
    pub const TRUNCATED: &str = r#"<?xml version="1.0"?><gpx><trk><trkseg><trkpt lat="45.0" lon="#;

    /// Track point with a non-numeric latitude.
    pub const BAD_COORDINATE: &str = r#"<gpx><trk><trkseg>
<trkpt lat="north" lon="7.0"></trkpt>
</trkseg></trk></gpx>
"#;
}
