//! Trackpoint readers for recorded activity files.
//!
//! Reads GPX 1.0/1.1 documents, optionally gzip-compressed, from a directory
//! and merges their track points into a single [`TrackSet`].
//!
//! [`TrackSet`]: heatmap_common::TrackSet

pub mod gpx;
pub mod source;

pub use gpx::{parse_gpx, read_gpx_file, GpxTrack};
pub use source::{GpxSource, TrackSource, YearFilter};
