//! Incremental CSV tables, one pair of files per (repository, entity kind).
//!
//! Layout under the output directory:
//!
//! ```text
//! <output_dir>/<issues|pull_requests|commits>/<owner>__<name>.csv
//! <output_dir>/<issues|pull_requests|commits>/<owner>__<name>.comments.csv
//! ```
//!
//! A pair whose entity table holds at least one data row is treated as
//! complete and is never fetched again. Every append reaches stable storage
//! before it returns, comments first, so a durable entity row always has its
//! comments alongside it.

mod error;

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, File};

use crate::github::locator::RepositoryTarget;
use crate::github::models::{CommentedEntity, EntityKind};

pub use error::SinkError;

/// Entity table header, in column order.
pub const ENTITY_COLUMNS: [&str; 14] = [
    "repository",
    "entity_kind",
    "entity_id",
    "number",
    "author",
    "created_at",
    "updated_at",
    "state",
    "title",
    "url",
    "body",
    "additions",
    "deletions",
    "comment_count",
];

/// Comment table header, in column order.
pub const COMMENT_COLUMNS: [&str; 9] = [
    "repository",
    "entity_kind",
    "parent_entity_id",
    "comment_id",
    "author",
    "created_at",
    "updated_at",
    "url",
    "body",
];

const TABLE_SUFFIX: &str = ".csv";
const COMMENT_TABLE_SUFFIX: &str = ".comments.csv";

/// Paths of the two tables belonging to one pair, relative to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    /// Entity table.
    pub entities: Utf8PathBuf,
    /// Comment table.
    pub comments: Utf8PathBuf,
}

/// Rows written to a pair's tables so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    /// Entity rows.
    pub entities: u64,
    /// Comment rows.
    pub comments: u64,
}

/// Result of the `delete` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Tables removed, relative to the root.
    pub removed: Vec<Utf8PathBuf>,
    /// Kinds whose directory did not exist.
    pub missing: Vec<EntityKind>,
}

/// Per-kind table statistics for the `info` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindStats {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity tables present.
    pub tables: u64,
    /// Entity data rows across all tables.
    pub entity_rows: u64,
    /// Comment data rows across all tables.
    pub comment_rows: u64,
    /// Bytes on disk across entity and comment tables.
    pub bytes: u64,
}

impl KindStats {
    const fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            tables: 0,
            entity_rows: 0,
            comment_rows: 0,
            bytes: 0,
        }
    }
}

/// Output directory holding every pair's tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStore {
    root: Utf8PathBuf,
}

impl TableStore {
    /// Creates a store rooted at `root`. Nothing is touched until a table is
    /// opened.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Table paths for a pair, relative to [`TableStore::root`].
    #[must_use]
    pub fn paths(&self, target: &RepositoryTarget, kind: EntityKind) -> TablePaths {
        let dir = Utf8Path::new(kind.dir_name());
        let stem = target.file_stem();
        TablePaths {
            entities: dir.join(format!("{stem}{TABLE_SUFFIX}")),
            comments: dir.join(format!("{stem}{COMMENT_TABLE_SUFFIX}")),
        }
    }

    /// Returns true when the pair's entity table holds at least one data row.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when an existing table cannot be read.
    pub fn is_completed(
        &self,
        target: &RepositoryTarget,
        kind: EntityKind,
    ) -> Result<bool, SinkError> {
        let Some(root) = self.open_root()? else {
            return Ok(false);
        };
        let paths = self.paths(target, kind);
        let Some(file) = open_existing(&root, &paths.entities).map_err(|error| {
            SinkError::io("open", self.root.join(&paths.entities), error)
        })?
        else {
            return Ok(false);
        };

        let mut reader = table_reader(file);
        match reader.byte_records().next() {
            None => Ok(false),
            Some(Ok(_)) => Ok(true),
            Some(Err(error)) => Err(SinkError::csv(self.root.join(&paths.entities), error)),
        }
    }

    /// Creates (or truncates) both tables for a pair and writes their headers.
    ///
    /// A pair is only opened when it is not complete, so any earlier partial
    /// content is stale and is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the directories or files cannot be created
    /// or the headers cannot be written.
    pub fn open(&self, target: &RepositoryTarget, kind: EntityKind) -> Result<PairTables, SinkError> {
        let root = self.create_root()?;
        let paths = self.paths(target, kind);
        let kind_dir = Utf8Path::new(kind.dir_name());
        root.create_dir_all(kind_dir)
            .map_err(|error| SinkError::io("create directory", self.root.join(kind_dir), error))?;

        let entity_path = self.root.join(&paths.entities);
        let comment_path = self.root.join(&paths.comments);
        let mut entities = TableWriter::create(&root, &paths.entities, entity_path)?;
        let mut comments = TableWriter::create(&root, &paths.comments, comment_path)?;
        comments.write_header(&COMMENT_COLUMNS)?;
        entities.write_header(&ENTITY_COLUMNS)?;

        Ok(PairTables {
            entities,
            comments,
            counts: TableCounts::default(),
        })
    }

    /// Removes both tables of a pair; missing files are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when an existing table cannot be removed.
    pub fn discard(&self, target: &RepositoryTarget, kind: EntityKind) -> Result<(), SinkError> {
        let Some(root) = self.open_root()? else {
            return Ok(());
        };
        let paths = self.paths(target, kind);
        for table in [&paths.entities, &paths.comments] {
            match root.remove_file(table) {
                Ok(()) => {}
                Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                Err(error) => return Err(SinkError::io("remove", self.root.join(table), error)),
            }
        }
        Ok(())
    }

    /// Removes every table under the directories of `kinds`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when a directory cannot be listed or a table
    /// cannot be removed.
    pub fn delete(&self, kinds: &[EntityKind]) -> Result<DeleteSummary, SinkError> {
        let mut summary = DeleteSummary::default();
        let root = self.open_root()?;

        for &kind in kinds {
            let kind_dir = Utf8Path::new(kind.dir_name());
            let Some(dir) = self.open_kind_dir(root.as_ref(), kind_dir)? else {
                summary.missing.push(kind);
                continue;
            };

            for name in table_names(&dir)
                .map_err(|error| SinkError::io("list", self.root.join(kind_dir), error))?
            {
                let relative = kind_dir.join(&name);
                dir.remove_file(&name)
                    .map_err(|error| SinkError::io("remove", self.root.join(&relative), error))?;
                summary.removed.push(relative);
            }
        }

        Ok(summary)
    }

    /// Counts tables, rows, and bytes for each of `kinds`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when a directory cannot be listed or a table
    /// cannot be read.
    pub fn stats(&self, kinds: &[EntityKind]) -> Result<Vec<KindStats>, SinkError> {
        let root = self.open_root()?;
        let mut all = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let mut stats = KindStats::empty(kind);
            let kind_dir = Utf8Path::new(kind.dir_name());
            if let Some(dir) = self.open_kind_dir(root.as_ref(), kind_dir)? {
                for name in table_names(&dir)
                    .map_err(|error| SinkError::io("list", self.root.join(kind_dir), error))?
                {
                    let path = self.root.join(kind_dir).join(&name);
                    let file = dir
                        .open(&name)
                        .map_err(|error| SinkError::io("open", path.clone(), error))?;
                    let bytes = file
                        .metadata()
                        .map_err(|error| SinkError::io("stat", path.clone(), error))?
                        .len();
                    let rows = count_rows(file, &path)?;

                    stats.bytes = stats.bytes.saturating_add(bytes);
                    if name.ends_with(COMMENT_TABLE_SUFFIX) {
                        stats.comment_rows = stats.comment_rows.saturating_add(rows);
                    } else {
                        stats.tables = stats.tables.saturating_add(1);
                        stats.entity_rows = stats.entity_rows.saturating_add(rows);
                    }
                }
            }
            all.push(stats);
        }

        Ok(all)
    }

    fn open_root(&self) -> Result<Option<Dir>, SinkError> {
        match Dir::open_ambient_dir(&self.root, ambient_authority()) {
            Ok(dir) => Ok(Some(dir)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(SinkError::io("open", self.root.clone(), error)),
        }
    }

    fn open_kind_dir(
        &self,
        root: Option<&Dir>,
        kind_dir: &Utf8Path,
    ) -> Result<Option<Dir>, SinkError> {
        let Some(parent) = root else {
            return Ok(None);
        };
        match parent.open_dir(kind_dir) {
            Ok(dir) => Ok(Some(dir)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(SinkError::io("open", self.root.join(kind_dir), error)),
        }
    }

    fn create_root(&self) -> Result<Dir, SinkError> {
        Dir::create_ambient_dir_all(&self.root, ambient_authority())
            .map_err(|error| SinkError::io("create directory", self.root.clone(), error))?;
        Dir::open_ambient_dir(&self.root, ambient_authority())
            .map_err(|error| SinkError::io("open", self.root.clone(), error))
    }
}

/// Open writers for one pair. Dropping without [`PairTables::close`] leaves
/// whatever has already been appended in place.
#[derive(Debug)]
pub struct PairTables {
    entities: TableWriter,
    comments: TableWriter,
    counts: TableCounts,
}

impl PairTables {
    /// Appends a batch of entities and their comments, then syncs both
    /// tables to disk.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when a row cannot be encoded or the data cannot
    /// be flushed and synced.
    pub fn append(&mut self, batch: &[CommentedEntity]) -> Result<TableCounts, SinkError> {
        let mut comments: u64 = 0;
        for item in batch {
            for comment in &item.comments {
                self.comments.write_row(comment)?;
                comments = comments.saturating_add(1);
            }
        }
        self.comments.sync()?;

        let mut entities: u64 = 0;
        for item in batch {
            self.entities.write_row(&item.entity)?;
            entities = entities.saturating_add(1);
        }
        self.entities.sync()?;

        self.counts.entities = self.counts.entities.saturating_add(entities);
        self.counts.comments = self.counts.comments.saturating_add(comments);
        Ok(self.counts)
    }

    /// Flushes and releases both tables.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the final flush fails.
    pub fn close(mut self) -> Result<TableCounts, SinkError> {
        self.comments.sync()?;
        self.entities.sync()?;
        Ok(self.counts)
    }
}

#[derive(Debug)]
struct TableWriter {
    path: Utf8PathBuf,
    writer: csv::Writer<File>,
}

impl TableWriter {
    fn create(root: &Dir, relative: &Utf8Path, path: Utf8PathBuf) -> Result<Self, SinkError> {
        let file = root
            .create(relative)
            .map_err(|error| SinkError::io("create", path.clone(), error))?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Ok(Self { path, writer })
    }

    fn write_header(&mut self, columns: &[&str]) -> Result<(), SinkError> {
        self.writer
            .write_record(columns)
            .map_err(|error| SinkError::csv(self.path.clone(), error))?;
        self.sync()
    }

    fn write_row<T: serde::Serialize>(&mut self, row: &T) -> Result<(), SinkError> {
        self.writer
            .serialize(row)
            .map_err(|error| SinkError::csv(self.path.clone(), error))
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .map_err(|error| SinkError::io("flush", self.path.clone(), error))?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|error| SinkError::io("sync", self.path.clone(), error))
    }
}

fn open_existing(root: &Dir, relative: &Utf8Path) -> io::Result<Option<File>> {
    match root.open(relative) {
        Ok(file) => Ok(Some(file)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

/// Names of the CSV tables in `dir`, sorted.
fn table_names(dir: &Dir) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for item in dir.entries()? {
        let entry = item?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name()?;
        if name.ends_with(TABLE_SUFFIX) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn table_reader(file: File) -> csv::Reader<File> {
    csv::ReaderBuilder::new().flexible(true).from_reader(file)
}

fn count_rows(file: File, path: &Utf8Path) -> Result<u64, SinkError> {
    let mut reader = table_reader(file);
    let mut rows: u64 = 0;
    for record in reader.byte_records() {
        record.map_err(|error| SinkError::csv(path, error))?;
        rows = rows.saturating_add(1);
    }
    Ok(rows)
}
