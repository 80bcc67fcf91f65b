//! Track sources: where trackpoints come from.

use crate::gpx::read_gpx_file;
use glob::Pattern;
use heatmap_common::{HeatmapError, HeatmapResult, TrackPoint, TrackSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Anything that can produce a merged set of trackpoints.
pub trait TrackSource {
    fn read_tracks(&self) -> HeatmapResult<TrackSet>;

    /// Human-readable description, used in empty-input errors.
    fn describe(&self) -> String;
}

/// Restricts activities to one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    /// Undated activities pass only [`YearFilter::All`].
    pub fn accepts(&self, year: Option<i32>) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Year(y) => year == Some(*y),
        }
    }
}

impl FromStr for YearFilter {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(YearFilter::All);
        }
        s.parse::<i32>().map(YearFilter::Year).map_err(|_| {
            HeatmapError::invalid_parameter("year", format!("'{}' is not a year or 'all'", s))
        })
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearFilter::All => f.write_str("all"),
            YearFilter::Year(y) => write!(f, "{}", y),
        }
    }
}

/// GPX files in one directory, selected by a file-name pattern.
#[derive(Debug, Clone)]
pub struct GpxSource {
    pub dir: PathBuf,
    /// Glob pattern (`*`, `?`, `[...]`) matched against file names.
    pub pattern: String,
    pub year: YearFilter,
}

impl GpxSource {
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>, year: YearFilter) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
            year,
        }
    }

    /// Regular files directly inside `dir` whose name matches, sorted by name.
    pub fn matching_files(&self) -> HeatmapResult<Vec<PathBuf>> {
        let pattern = Pattern::new(&self.pattern)
            .map_err(|e| HeatmapError::invalid_parameter("gpx_filter", e.to_string()))?;

        if !self.dir.is_dir() {
            warn!(dir = %self.dir.display(), "Track directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| HeatmapError::Io(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matched = entry
                .file_name()
                .to_str()
                .map(|name| pattern.matches(name))
                .unwrap_or(false);
            if matched {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Points of one file; empty when it is unreadable or from another year.
    fn read_points(&self, path: &Path) -> Vec<TrackPoint> {
        let track = match read_gpx_file(path) {
            Ok(track) => track,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable track file");
                return Vec::new();
            }
        };

        if !self.year.accepts(track.year()) {
            debug!(file = %path.display(), year = ?track.year(), "Filtered out by year");
            return Vec::new();
        }
        if track.points.is_empty() {
            debug!(file = %path.display(), "No track points");
        }

        track.points
    }
}

impl TrackSource for GpxSource {
    #[instrument(
        skip(self),
        fields(dir = %self.dir.display(), pattern = %self.pattern, year = %self.year)
    )]
    fn read_tracks(&self) -> HeatmapResult<TrackSet> {
        let files = self.matching_files()?;
        if files.is_empty() {
            warn!("No track files match");
            return Ok(TrackSet::default());
        }

        // Every matched file counts as an activity, contributing points or not.
        let mut merged = TrackSet::default();
        for path in &files {
            merged.merge(TrackSet::new(self.read_points(path), 1));
        }

        info!(
            files = files.len(),
            activities = merged.activity_count,
            points = merged.len(),
            "Loaded trackpoints"
        );
        Ok(merged)
    }

    fn describe(&self) -> String {
        format!(
            "{} in {} (year: {})",
            self.pattern,
            self.dir.display(),
            self.year
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_filter_parse() {
        assert_eq!("all".parse::<YearFilter>().unwrap(), YearFilter::All);
        assert_eq!("ALL".parse::<YearFilter>().unwrap(), YearFilter::All);
        assert_eq!("2021".parse::<YearFilter>().unwrap(), YearFilter::Year(2021));
        assert!("last".parse::<YearFilter>().is_err());
    }

    #[test]
    fn test_year_filter_accepts() {
        assert!(YearFilter::All.accepts(None));
        assert!(YearFilter::All.accepts(Some(1999)));
        assert!(YearFilter::Year(2021).accepts(Some(2021)));
        assert!(!YearFilter::Year(2021).accepts(Some(2020)));
        assert!(!YearFilter::Year(2021).accepts(None));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let source = GpxSource::new("/nonexistent/track/dir", "*.gpx", YearFilter::All);
        let set = source.read_tracks().unwrap();
        assert!(set.is_empty());
        assert_eq!(set.activity_count, 0);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = GpxSource::new(dir.path(), "[*.gpx", YearFilter::All);
        assert!(matches!(
            source.matching_files(),
            Err(HeatmapError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_describe() {
        let source = GpxSource::new("data", "*.gpx", YearFilter::Year(2020));
        assert_eq!(source.describe(), "*.gpx in data (year: 2020)");
    }
}
