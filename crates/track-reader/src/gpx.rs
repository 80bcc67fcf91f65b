//! GPX document parsing.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use flate2::read::GzDecoder;
use heatmap_common::{HeatmapError, HeatmapResult, TrackPoint};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Points and start time of one activity file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxTrack {
    /// Every `<trkpt>` in document order, across all tracks and segments.
    pub points: Vec<TrackPoint>,
    /// Value of the first `<time>` element in the document.
    pub time: Option<DateTime<Utc>>,
}

impl GpxTrack {
    /// Calendar year of the activity, if dated.
    pub fn year(&self) -> Option<i32> {
        self.time.map(|t| t.year())
    }
}

/// Read a `.gpx` or gzip-compressed `.gpx.gz` file.
pub fn read_gpx_file(path: &Path) -> HeatmapResult<GpxTrack> {
    let raw = fs::read(path)?;

    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let parsed = if is_gzip {
        let mut decoded = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut decoded)
            .map_err(|e| HeatmapError::Parse(format!("{}: gzip: {}", path.display(), e)))?;
        parse_gpx(&decoded)
    } else {
        parse_gpx(&raw)
    };

    parsed.map_err(|e| match e {
        HeatmapError::Parse(msg) => HeatmapError::Parse(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse a GPX document.
///
/// Namespace prefixes are ignored. Elements other than `<trkpt>` and
/// `<time>` are skipped. A track point without valid `lat`/`lon`
/// attributes, or a document that ends inside an element, is an error.
pub fn parse_gpx(xml: &[u8]) -> HeatmapResult<GpxTrack> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut track = GpxTrack::default();
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut in_first_time = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"trkpt" => track.points.push(parse_trackpoint(&e)?),
                    b"time" if track.time.is_none() => in_first_time = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    track.points.push(parse_trackpoint(&e)?);
                }
            }
            Ok(Event::Text(t)) if in_first_time => {
                let text = t
                    .unescape()
                    .map_err(|e| HeatmapError::Parse(format!("time: {}", e)))?;
                track.time = parse_time(&text);
                in_first_time = false;
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if e.local_name().as_ref() == b"time" {
                    in_first_time = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(HeatmapError::Parse(format!(
                    "XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(HeatmapError::Parse(
            "document ended inside an open element".to_string(),
        ));
    }

    Ok(track)
}

fn parse_trackpoint(e: &BytesStart<'_>) -> HeatmapResult<TrackPoint> {
    let mut lat = None;
    let mut lon = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|err| HeatmapError::Parse(format!("trkpt attribute: {}", err)))?;
        let target = match attr.key.local_name().as_ref() {
            b"lat" => &mut lat,
            b"lon" => &mut lon,
            _ => continue,
        };
        let value = attr
            .unescape_value()
            .map_err(|err| HeatmapError::Parse(format!("trkpt attribute: {}", err)))?;
        let parsed = value.trim().parse::<f64>().map_err(|_| {
            HeatmapError::Parse(format!("trkpt coordinate '{}' is not a number", value))
        })?;
        *target = Some(parsed);
    }

    match (lat, lon) {
        (Some(lat), Some(lon))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
        {
            Ok(TrackPoint::new(lat, lon))
        }
        (Some(lat), Some(lon)) => Err(HeatmapError::Parse(format!(
            "trkpt ({}, {}) is out of range",
            lat, lon
        ))),
        _ => Err(HeatmapError::Parse(
            "trkpt is missing lat or lon".to_string(),
        )),
    }
}

/// ISO 8601 with offset, or naive (treated as UTC).
fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
