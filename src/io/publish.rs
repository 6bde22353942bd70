//! All-or-nothing publication of the artifact set.
//!
//! Every artifact is rendered in memory first. Publishing writes them into a
//! sibling staging directory and swaps it into place with renames, so the
//! output directory either keeps its previous contents or holds the complete
//! new set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{export, geojson};
use crate::error::{Error, Result};
use crate::pipeline::PipelineOutput;

pub const ENRICHED_GEOJSON: &str = "clusters_enriched.geojson";
pub const ENRICHED_SUMMARY_CSV: &str = "clusters_enriched_summary.csv";
pub const DEMAND_GEOJSON: &str = "demand_forecasts.geojson";
pub const DEMAND_CSV: &str = "demand_forecasts.csv";
pub const TRAJECTORY_CSV: &str = "demand_trajectories.csv";
pub const SUMMARY_JSON: &str = "summary_metrics.json";
pub const SCENARIO_DIR: &str = "scenarios";
pub const COMPARISON_CSV: &str = "scenario_comparison.csv";

/// Rendered artifacts keyed by path relative to the output directory.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, relative: impl Into<PathBuf>, contents: Vec<u8>) {
        self.files.push((relative.into(), contents));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(p, _)| p.as_path())
    }

    /// Renders every artifact of a pipeline run.
    ///
    /// # Errors
    ///
    /// Returns a CSV or JSON error if any artifact fails to render; nothing
    /// is written to disk in that case.
    pub fn from_output(output: &PipelineOutput) -> Result<Self> {
        let scored = &output.scoring.clusters;
        let mut set = Self::new();

        set.add(
            ENRICHED_GEOJSON,
            serde_json::to_vec(&geojson::enriched_collection(&output.scoring)?)?,
        );

        let mut buf = Vec::new();
        export::write_scored_csv(scored, &mut buf)?;
        set.add(ENRICHED_SUMMARY_CSV, buf);

        set.add(
            DEMAND_GEOJSON,
            serde_json::to_vec(&geojson::demand_collection(scored, &output.demand))?,
        );

        let mut buf = Vec::new();
        export::write_demand_csv(scored, &output.demand, output.totals.horizon_year, &mut buf)?;
        set.add(DEMAND_CSV, buf);

        let mut buf = Vec::new();
        export::write_trajectory_csv(&output.trajectories, &mut buf)?;
        set.add(TRAJECTORY_CSV, buf);

        let mut buf = Vec::new();
        export::write_summary_json(&output.totals, &mut buf)?;
        set.add(SUMMARY_JSON, buf);

        let scenario_dir = Path::new(SCENARIO_DIR);
        let mut buf = Vec::new();
        export::write_comparison_csv(&output.scenario_results(), &mut buf)?;
        set.add(scenario_dir.join(COMPARISON_CSV), buf);

        for outcome in &output.scenarios {
            let name = format!("{}.geojson", outcome.config.slug());
            set.add(
                scenario_dir.join(name),
                serde_json::to_vec(&geojson::scenario_collection(scored, outcome))?,
            );
        }

        debug!(artifacts = set.len(), "rendered artifacts");
        Ok(set)
    }

    /// Replaces `out_dir` with exactly this artifact set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Publish`] naming the path that failed. On failure
    /// the previous contents of `out_dir` are left in place.
    pub fn publish(&self, out_dir: &Path) -> Result<()> {
        let staging = sibling(out_dir, "staging")?;
        let previous = sibling(out_dir, "previous")?;

        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(publish_error(&staging))?;
        }
        if let Err(e) = self.write_all(&staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        if previous.exists() {
            fs::remove_dir_all(&previous).map_err(publish_error(&previous))?;
        }
        let had_previous = out_dir.exists();
        if had_previous {
            fs::rename(out_dir, &previous).map_err(publish_error(out_dir))?;
        }
        if let Err(e) = fs::rename(&staging, out_dir) {
            if had_previous && fs::rename(&previous, out_dir).is_err() {
                warn!(path = %previous.display(), "could not restore previous artifacts");
            }
            let _ = fs::remove_dir_all(&staging);
            return Err(publish_error(out_dir)(e));
        }
        if had_previous {
            if let Err(e) = fs::remove_dir_all(&previous) {
                warn!(path = %previous.display(), error = %e, "could not remove previous artifacts");
            }
        }

        info!(path = %out_dir.display(), artifacts = self.len(), "published artifacts");
        Ok(())
    }

    fn write_all(&self, root: &Path) -> Result<()> {
        fs::create_dir_all(root).map_err(publish_error(root))?;
        for (relative, contents) in &self.files {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(publish_error(parent))?;
            }
            fs::write(&path, contents).map_err(publish_error(&path))?;
        }
        Ok(())
    }
}

fn publish_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Publish {
        path: path.to_path_buf(),
        source,
    }
}

/// `<parent>/.<name>.<suffix>`, on the same filesystem as `dir`.
fn sibling(dir: &Path, suffix: &str) -> Result<PathBuf> {
    let name = dir.file_name().ok_or_else(|| Error::Publish {
        path: dir.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "output path has no final component"),
    })?;
    let mut sibling_name = std::ffi::OsString::from(".");
    sibling_name.push(name);
    sibling_name.push(".");
    sibling_name.push(suffix);
    Ok(dir.with_file_name(sibling_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArtifactSet {
        let mut set = ArtifactSet::new();
        set.add("a.txt", b"alpha".to_vec());
        set.add(Path::new("nested").join("b.txt"), b"beta".to_vec());
        set
    }

    #[test]
    fn publishes_into_fresh_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let out = tmp.path().join("out");
        sample().publish(&out).expect("publish");
        assert_eq!(fs::read(out.join("a.txt")).ok(), Some(b"alpha".to_vec()));
        assert_eq!(fs::read(out.join("nested/b.txt")).ok(), Some(b"beta".to_vec()));
        assert!(!tmp.path().join(".out.staging").exists());
    }

    #[test]
    fn replaces_previous_contents_entirely() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).expect("mkdir");
        fs::write(out.join("stale.txt"), b"old").expect("write");
        sample().publish(&out).expect("publish");
        assert!(!out.join("stale.txt").exists());
        assert!(out.join("a.txt").exists());
        assert!(!tmp.path().join(".out.previous").exists());
    }

    #[test]
    fn failed_write_keeps_previous_contents() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).expect("mkdir");
        fs::write(out.join("keep.txt"), b"old").expect("write");

        // A file and a directory cannot share a path.
        let mut set = ArtifactSet::new();
        set.add("clash", b"file".to_vec());
        set.add(Path::new("clash").join("inner.txt"), b"x".to_vec());

        let err = set.publish(&out);
        assert!(matches!(err, Err(Error::Publish { .. })));
        assert_eq!(fs::read(out.join("keep.txt")).ok(), Some(b"old".to_vec()));
        assert!(!tmp.path().join(".out.staging").exists());
    }

    #[test]
    fn sibling_paths() {
        let p = sibling(Path::new("/tmp/run/out"), "staging").ok();
        assert_eq!(p, Some(PathBuf::from("/tmp/run/.out.staging")));
        assert!(sibling(Path::new("/"), "staging").is_err());
    }
}
