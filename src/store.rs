//! Activity storage collaborators
//!
//! The engine does not know where activity bytes live. An [`ActivitySource`]
//! hands over every activity of one owner together with its calendar date,
//! optionally only those inside a date range.
//! [`DirectoryStore`] reads `<root>/<owner>/*.fit`; [`MemoryStore`] serves
//! activities already in memory.

use chrono::{DateTime, NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::error::{PowerCurveError, Result};
use crate::import::{has_fit_extension, peek_activity_date};
use crate::models::{ActivityFile, DateRange};

/// Bytes read to date a file before the rest of it is loaded
const DATE_PROBE_LEN: u64 = 4096;

/// Supplies the stored activities of an owner
pub trait ActivitySource {
    /// All activities of `owner`; an unknown owner has none
    fn activities(&self, owner: &str) -> Result<Vec<ActivityFile>>;

    /// Activities of `owner` dated inside `range`
    ///
    /// Sources that can date an activity without loading it override this.
    fn activities_in(&self, owner: &str, range: &DateRange) -> Result<Vec<ActivityFile>> {
        Ok(self
            .activities(owner)?
            .into_iter()
            .filter(|a| range.contains(a.date))
            .collect())
    }
}

/// Activities kept in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    activities: Vec<ActivityFile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, activity: ActivityFile) {
        self.activities.push(activity);
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl FromIterator<ActivityFile> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = ActivityFile>>(iter: I) -> Self {
        Self {
            activities: iter.into_iter().collect(),
        }
    }
}

impl ActivitySource for MemoryStore {
    fn activities(&self, owner: &str) -> Result<Vec<ActivityFile>> {
        Ok(self
            .activities
            .iter()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect())
    }
}

/// Activity files laid out as `<root>/<owner>/<name>.fit`
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    extensions: Vec<String>,
    show_progress: bool,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec!["fit".to_string()],
            show_progress: false,
        }
    }

    /// Accepted file extensions, compared case-insensitively
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `owner`; the id must be a single plain path component
    pub fn owner_dir(&self, owner: &str) -> Result<PathBuf> {
        let mut components = Path::new(owner).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single || owner.contains(['/', '\\']) {
            return Err(PowerCurveError::InvalidOwner(owner.to_string()));
        }
        Ok(self.root.join(owner))
    }

    /// Store `bytes` under `owner`, creating the owner directory as needed
    pub fn save(&self, owner: &str, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.owner_dir(owner)?;
        fs::create_dir_all(&dir)?;
        let path = dir.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return has_fit_extension(path);
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    }

    fn collect_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let entries = fs::read_dir(dir).map_err(|e| PowerCurveError::Store {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && self.accepts(&path) {
                files.push(path);
            }
        }
        // Directory order is platform dependent
        files.sort();
        Ok(files)
    }

    /// Load one file, or only its head when its date falls outside `range`
    fn load(
        &self,
        owner: &str,
        path: &Path,
        range: Option<&DateRange>,
    ) -> Result<Option<ActivityFile>> {
        let store_error = |e: std::io::Error| PowerCurveError::Store {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let mut file = File::open(path).map_err(store_error)?;
        let mut bytes = Vec::new();
        file.by_ref()
            .take(DATE_PROBE_LEN)
            .read_to_end(&mut bytes)
            .map_err(store_error)?;
        let mut complete = (bytes.len() as u64) < DATE_PROBE_LEN;

        let mut date = peek_activity_date(&bytes);
        if date.is_none() && !complete {
            file.read_to_end(&mut bytes).map_err(store_error)?;
            complete = true;
            date = peek_activity_date(&bytes);
        }

        let Some(date) = date.or_else(|| modified_date(path)) else {
            warn!("No activity date for {}, skipping", path.display());
            return Ok(None);
        };

        if let Some(range) = range {
            if !range.contains(date) {
                trace!("{} dated {} is outside the range", path.display(), date);
                return Ok(None);
            }
        }

        if !complete {
            file.read_to_end(&mut bytes).map_err(store_error)?;
        }

        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Some(ActivityFile::new(id, owner, date, bytes)))
    }

    fn scan(&self, owner: &str, range: Option<&DateRange>) -> Result<Vec<ActivityFile>> {
        let dir = self.owner_dir(owner)?;
        if !dir.is_dir() {
            debug!("No activity directory for owner {}: {}", owner, dir.display());
            return Ok(Vec::new());
        }

        let files = self.collect_files(&dir)?;
        debug!("Found {} activity files in {}", files.len(), dir.display());

        let progress = self.show_progress.then(|| {
            let pb = ProgressBar::new(files.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        });

        let mut activities = Vec::with_capacity(files.len());
        for path in &files {
            if let Some(pb) = &progress {
                pb.set_message(format!(
                    "Reading {}",
                    path.file_name().unwrap_or_default().to_string_lossy()
                ));
            }
            if let Some(activity) = self.load(owner, path, range)? {
                activities.push(activity);
            }
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message(format!("Loaded {} activities", activities.len()));
        }
        Ok(activities)
    }
}

impl ActivitySource for DirectoryStore {
    fn activities(&self, owner: &str) -> Result<Vec<ActivityFile>> {
        self.scan(owner, None)
    }

    /// Only files whose head dates them inside `range` are read in full
    fn activities_in(&self, owner: &str, range: &DateRange) -> Result<Vec<ActivityFile>> {
        self.scan(owner, Some(range))
    }
}

/// Fallback date for files whose content carries none
fn modified_date(path: &Path) -> Option<NaiveDate> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified).date_naive())
}
