// src/store.rs
//! The three on-disk tables.
//!
//! - raw: every record ever fetched, newest fetch first, merged on write.
//! - transformed: publish-ready records, regenerated from raw every run.
//! - failures: this run's failed episode numbers, replaced on write.
//!
//! Columns are located by header name on read and always written in the
//! declared order.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::options::StoreOptions;
use crate::csv::{parse_rows, rows_to_string};
use crate::error::StoreError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EpisodeRecord {
    pub num: u32,
    pub title: String,
    pub download_url: String,
    pub description: String,
    pub pubdate: String,
    pub url: String,
    pub full_url: String,
}

impl EpisodeRecord {
    /// Placeholder lookup for templates.
    pub fn field(&self, name: &str) -> Option<String> {
        let v = match name {
            "num" => return Some(self.num.to_string()),
            "title" => &self.title,
            "download_url" => &self.download_url,
            "description" => &self.description,
            "pubdate" => &self.pubdate,
            "url" => &self.url,
            "full_url" => &self.full_url,
            _ => return None,
        };
        Some(v.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchFailure {
    pub num: u32,
    pub reason: String,
}

/// A fixed-schema table row.
pub trait Row: Sized {
    const COLUMNS: &'static [&'static str];

    /// `cells` is in `COLUMNS` order.
    fn from_cells(cells: Vec<String>) -> Result<Self, &'static str>;
    fn to_cells(&self) -> Vec<String>;
}

impl Row for EpisodeRecord {
    const COLUMNS: &'static [&'static str] =
        &["num", "title", "download_url", "description", "pubdate", "url", "full_url"];

    fn from_cells(cells: Vec<String>) -> Result<Self, &'static str> {
        let [num, title, download_url, description, pubdate, url, full_url]: [String; 7] =
            cells.try_into().map_err(|_| "row")?;
        Ok(Self {
            num: parse_num(&num)?,
            title,
            download_url,
            description,
            pubdate,
            url,
            full_url,
        })
    }

    fn to_cells(&self) -> Vec<String> {
        vec![
            self.num.to_string(),
            self.title.clone(),
            self.download_url.clone(),
            self.description.clone(),
            self.pubdate.clone(),
            self.url.clone(),
            self.full_url.clone(),
        ]
    }
}

impl Row for FetchFailure {
    const COLUMNS: &'static [&'static str] = &["num", "exc"];

    fn from_cells(cells: Vec<String>) -> Result<Self, &'static str> {
        let [num, reason]: [String; 2] = cells.try_into().map_err(|_| "row")?;
        Ok(Self { num: parse_num(&num)?, reason })
    }

    fn to_cells(&self) -> Vec<String> {
        vec![self.num.to_string(), self.reason.clone()]
    }
}

/// Returns the offending column name on failure.
fn parse_num(cell: &str) -> Result<u32, &'static str> {
    cell.trim().parse().map_err(|_| "num")
}

/* ---------------- Generic table I/O ---------------- */

pub fn read_table<R: Row>(path: &Path) -> Result<Vec<R>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
    };

    let mut rows = parse_rows(&text).into_iter();
    let (_, header) = rows.next().ok_or_else(|| StoreError::NoHeader(path.to_path_buf()))?;

    // Position of each declared column in the file
    let mut index = Vec::with_capacity(R::COLUMNS.len());
    for &col in R::COLUMNS {
        let ix = header
            .iter()
            .position(|h| h.trim() == col)
            .ok_or(StoreError::MissingColumn { path: path.to_path_buf(), column: col })?;
        index.push(ix);
    }

    let mut out = Vec::new();
    for (line, mut row) in rows {
        if row.len() != header.len() {
            return Err(StoreError::Ragged {
                path: path.to_path_buf(),
                line,
                expected: header.len(),
                found: row.len(),
            });
        }
        let cells: Vec<String> = index.iter().map(|&ix| std::mem::take(&mut row[ix])).collect();
        let raw_num = cells[0].clone();
        let rec = R::from_cells(cells).map_err(|column| StoreError::BadValue {
            path: path.to_path_buf(),
            line,
            column,
            value: raw_num,
        })?;
        out.push(rec);
    }

    debug!(path = %path.display(), rows = out.len(), "read table");
    Ok(out)
}

/// Replace the table at `path`. Goes through a sibling temp file + rename.
pub fn write_table<R: Row>(path: &Path, rows: &[R]) -> Result<(), StoreError> {
    let staged = stage_table(path, rows)?;
    staged.commit()
}

/// A table fully written to its temp sibling, not yet renamed into place.
/// Dropping it without `commit` removes the temp file.
#[derive(Debug)]
pub struct Staged {
    tmp: PathBuf,
    path: PathBuf,
    rows: usize,
    committed: bool,
}

impl Staged {
    pub fn commit(mut self) -> Result<(), StoreError> {
        fs::rename(&self.tmp, &self.path)
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
        self.committed = true;
        debug!(path = %self.path.display(), rows = self.rows, "wrote table");
        Ok(())
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

pub fn stage_table<R: Row>(path: &Path, rows: &[R]) -> Result<Staged, StoreError> {
    let io_err = |source| StoreError::Io { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let body: Vec<Vec<String>> = rows.iter().map(R::to_cells).collect();
    let contents = rows_to_string(R::COLUMNS, &body);

    let tmp = tmp_path(path);
    fs::write(&tmp, contents).map_err(io_err)?;
    Ok(Staged { tmp, path: path.to_path_buf(), rows: rows.len(), committed: false })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/* ---------------- Merge policy ---------------- */

/// New rows go before old ones, then `(num, download_url)` duplicates are
/// dropped keeping the first. The latest fetch wins.
pub fn merge_raw(new: Vec<EpisodeRecord>, old: Vec<EpisodeRecord>) -> Vec<EpisodeRecord> {
    let mut seen: HashSet<(u32, String)> = HashSet::new();
    new.into_iter()
        .chain(old)
        .filter(|r| seen.insert((r.num, r.download_url.clone())))
        .collect()
}

/* ---------------- Store ---------------- */

pub struct Store {
    opts: StoreOptions,
}

impl Store {
    pub fn new(opts: StoreOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &StoreOptions { &self.opts }

    pub fn read_raw(&self) -> Result<Vec<EpisodeRecord>, StoreError> {
        read_table(&self.opts.raw_path())
    }

    pub fn read_transformed(&self) -> Result<Vec<EpisodeRecord>, StoreError> {
        read_table(&self.opts.transformed_path())
    }

    pub fn read_failures(&self) -> Result<Vec<FetchFailure>, StoreError> {
        read_table(&self.opts.failures_path())
    }

    /// Merge `new` into the persisted raw table. Returns the merged row count.
    pub fn write_raw(&self, new: Vec<EpisodeRecord>) -> Result<usize, StoreError> {
        let old = self.read_raw()?;
        let merged = merge_raw(new, old);
        write_table(&self.opts.raw_path(), &merged)?;
        Ok(merged.len())
    }

    /// Merge `new` into raw and replace the failure table as one step. Both
    /// temp files are written before either is renamed, so a failed write
    /// leaves both tables as they were. Returns the merged raw row count.
    pub fn write_batch(
        &self,
        new: Vec<EpisodeRecord>,
        mut failures: Vec<FetchFailure>,
    ) -> Result<usize, StoreError> {
        let merged = merge_raw(new, self.read_raw()?);
        failures.sort_by_key(|f| f.num);

        let raw = stage_table(&self.opts.raw_path(), &merged)?;
        let missing = stage_table(&self.opts.failures_path(), &failures)?;
        missing.commit()?;
        raw.commit()?;
        Ok(merged.len())
    }

    pub fn write_transformed(&self, rows: &[EpisodeRecord]) -> Result<(), StoreError> {
        write_table(&self.opts.transformed_path(), rows)
    }

    /// Replaces the whole failure table, sorted by episode number.
    pub fn write_failures(&self, mut failures: Vec<FetchFailure>) -> Result<(), StoreError> {
        failures.sort_by_key(|f| f.num);
        write_table(&self.opts.failures_path(), &failures)
    }

    /// Create any missing table as an empty one. Existing tables are left alone.
    pub fn init(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut created = Vec::new();

        for path in [self.opts.raw_path(), self.opts.transformed_path()] {
            if !path.exists() {
                write_table::<EpisodeRecord>(&path, &[])?;
                created.push(path);
            }
        }
        let failures = self.opts.failures_path();
        if !failures.exists() {
            write_table::<FetchFailure>(&failures, &[])?;
            created.push(failures);
        }

        for p in &created {
            info!(path = %p.display(), "created empty table");
        }
        Ok(created)
    }
}
