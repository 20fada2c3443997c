//! CSV persistence for generated test cases
//!
//! Files live in a single output directory and are named
//! `{base}_{YYYYMMDD_HHMMSS}.csv`. Names are claimed with create-new semantics
//! so concurrent requests never overwrite each other's output.

use chrono::{DateTime, Local};
use regex::Regex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::story::DEFAULT_FILENAME;
use crate::testcase::TestCase;

/// CSV header, in column order.
pub const CSV_HEADER: [&str; 5] = [
    "ID",
    "Title",
    "Steps",
    "Expected Results",
    "Acceptance Criteria",
];

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "generated_test_cases";

const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("No test cases to save")]
    NothingToSave,

    #[error("Permission denied: Cannot write to output directory")]
    PermissionDenied,

    #[error("Failed to create output directory: {0}")]
    CreateDir(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("File not found")]
    NotFound,

    #[error("Failed to delete file: {0}")]
    Delete(String),
}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(e) if e.kind() == ErrorKind::PermissionDenied => {
                StorageError::PermissionDenied
            }
            _ => StorageError::Write(err.to_string()),
        }
    }
}

fn write_error(err: io::Error) -> StorageError {
    if err.kind() == ErrorKind::PermissionDenied {
        StorageError::PermissionDenied
    } else {
        StorageError::Write(err.to_string())
    }
}

/// A file written by [`CsvStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub filename: String,
    pub filepath: PathBuf,
    pub count: usize,
}

/// Turn a user-supplied name into a safe file stem.
///
/// A trailing `.csv` is dropped and anything outside `[A-Za-z0-9_-]` becomes
/// `_`. Input without a single alphanumeric character yields the default name.
pub fn sanitize_base_name(base: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());

    let trimmed = base.trim();
    let stem = trimmed
        .strip_suffix(".csv")
        .or_else(|| trimmed.strip_suffix(".CSV"))
        .unwrap_or(trimmed)
        .trim();

    let cleaned = unsafe_chars.replace_all(stem, "_").into_owned();
    if !cleaned.chars().any(|c| c.is_ascii_alphanumeric()) {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned
    }
}

/// Build the timestamped filename for a base name.
///
/// `attempt` 0 is the plain timestamped name; later attempts append a counter.
pub fn timestamped_filename(base: &str, now: &DateTime<Local>, attempt: u32) -> String {
    let stem = sanitize_base_name(base);
    let timestamp = now.format("%Y%m%d_%H%M%S");
    if attempt == 0 {
        format!("{stem}_{timestamp}.csv")
    } else {
        format!("{stem}_{timestamp}_{attempt}.csv")
    }
}

fn write_rows<W: io::Write>(
    writer: &mut csv::Writer<W>,
    test_cases: &[TestCase],
) -> Result<(), StorageError> {
    writer.write_record(CSV_HEADER)?;
    for case in test_cases {
        writer.write_record([
            &case.id,
            &case.title,
            &case.steps,
            &case.expected_result,
            &case.acceptance_criteria,
        ])?;
    }
    writer.flush().map_err(write_error)
}

/// Write the CSV into `out`, removing `filepath` if anything fails so no
/// partial file is left behind.
fn write_or_remove<W: io::Write>(
    out: W,
    filepath: &Path,
    test_cases: &[TestCase],
) -> Result<(), StorageError> {
    let mut writer = csv::Writer::from_writer(out);
    let written = write_rows(&mut writer, test_cases);
    drop(writer);

    if written.is_err() {
        let _ = fs::remove_file(filepath);
    }
    written
}

/// Stores generated CSV files under one directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    output_dir: PathBuf,
}

impl CsvStore {
    /// Open the store, creating the output directory if needed.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| StorageError::CreateDir(e.to_string()))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write test cases to a new timestamped file.
    pub fn save(&self, test_cases: &[TestCase], base: &str) -> Result<SavedFile, StorageError> {
        self.save_at(test_cases, base, &Local::now())
    }

    /// [`CsvStore::save`] with an explicit clock reading.
    pub fn save_at(
        &self,
        test_cases: &[TestCase],
        base: &str,
        now: &DateTime<Local>,
    ) -> Result<SavedFile, StorageError> {
        if test_cases.is_empty() {
            return Err(StorageError::NothingToSave);
        }

        let (filename, filepath, file) = self.claim(base, now)?;

        write_or_remove(file, &filepath, test_cases)?;

        Ok(SavedFile {
            filename,
            filepath,
            count: test_cases.len(),
        })
    }

    fn claim(
        &self,
        base: &str,
        now: &DateTime<Local>,
    ) -> Result<(String, PathBuf, File), StorageError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = timestamped_filename(base, now, attempt);
            let filepath = self.output_dir.join(&filename);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&filepath)
            {
                Ok(file) => return Ok((filename, filepath, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(write_error(e)),
            }
        }

        Err(StorageError::Write(format!(
            "no free filename for '{}' after {MAX_NAME_ATTEMPTS} attempts",
            sanitize_base_name(base)
        )))
    }

    /// Resolve a stored filename to its path.
    ///
    /// Only plain names of existing files inside the output directory resolve.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        if !is_plain_name(filename) {
            return Err(StorageError::NotFound);
        }

        let path = self.output_dir.join(filename);
        if path.is_file() {
            Ok(path)
        } else {
            Err(StorageError::NotFound)
        }
    }

    /// CSV filenames in the output directory, newest first.
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.output_dir) else {
            return Vec::new();
        };

        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".csv"))
            .collect();

        files.sort_unstable_by(|a, b| b.cmp(a));
        files
    }

    pub fn delete(&self, filename: &str) -> Result<(), StorageError> {
        let path = self.resolve(filename)?;
        fs::remove_file(path).map_err(|e| StorageError::Delete(e.to_string()))
    }
}

fn is_plain_name(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0'])
        && !filename.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn case(id: &str) -> TestCase {
        TestCase {
            id: id.to_string(),
            title: format!("Title {id}"),
            steps: "1. Open page\n2. Click \"Login\"".to_string(),
            expected_result: "Logged in, redirected".to_string(),
            acceptance_criteria: "AC1".to_string(),
        }
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    // ============================================================================
    // naming
    // ============================================================================

    #[test]
    fn test_sanitize_strips_csv_suffix() {
        assert_eq!(sanitize_base_name("login.csv"), "login");
        assert_eq!(sanitize_base_name(" login.CSV "), "login");
    }

    #[test]
    fn test_sanitize_blank_defaults() {
        assert_eq!(sanitize_base_name(""), "test_cases");
        assert_eq!(sanitize_base_name(".csv"), "test_cases");
        assert_eq!(sanitize_base_name(".."), "test_cases");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_base_name("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_base_name("my cases v1.2"), "my_cases_v1_2");
    }

    #[test]
    fn test_timestamped_filename() {
        let now = fixed_time();
        assert_eq!(
            timestamped_filename("test_cases", &now, 0),
            "test_cases_20240101_120000.csv"
        );
        assert_eq!(
            timestamped_filename("test_cases", &now, 2),
            "test_cases_20240101_120000_2.csv"
        );
    }

    // ============================================================================
    // save
    // ============================================================================

    #[test]
    fn test_save_writes_header_and_rows() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(temp_dir.path()).unwrap();
        let cases: Vec<TestCase> = (1..=5).map(|i| case(&format!("TC00{i}"))).collect();

        let saved = store.save_at(&cases, "test_cases", &fixed_time()).unwrap();

        assert_eq!(saved.filename, "test_cases_20240101_120000.csv");
        assert_eq!(saved.count, 5);
        assert_eq!(saved.filepath, temp_dir.path().join(&saved.filename));

        let rows = read_rows(&saved.filepath);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], CSV_HEADER);
        assert_eq!(rows[1][0], "TC001");
        assert_eq!(rows[1][2], "1. Open page\n2. Click \"Login\"");
    }

    #[test]
    fn test_save_twice_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(temp_dir.path()).unwrap();
        let cases = vec![case("TC001")];

        let first = store.save_at(&cases, "dup", &fixed_time()).unwrap();
        let second = store.save_at(&cases, "dup", &fixed_time()).unwrap();

        assert_ne!(first.filepath, second.filepath);
        assert_eq!(second.filename, "dup_20240101_120000_1.csv");
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_save_empty_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(temp_dir.path()).unwrap();

        let err = store.save(&[], "empty").unwrap_err();
        assert!(matches!(err, StorageError::NothingToSave));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let store = CsvStore::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.output_dir(), nested.as_path());
    }

    #[test]
    fn test_save_quotes_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(temp_dir.path()).unwrap();

        let saved = store.save(&[case("TC001")], "quoted").unwrap();

        let text = fs::read_to_string(&saved.filepath).unwrap();
        assert!(text.starts_with("ID,Title,Steps,Expected Results,Acceptance Criteria\n"));
        assert!(text.contains("\"Logged in, redirected\""));
    }

    /// Accepts nothing; every write fails with `kind`.
    struct BrokenWriter(ErrorKind);

    impl io::Write for BrokenWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(self.0, "broken"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_removes_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let filepath = temp_dir.path().join("partial_20240101_120000.csv");
        fs::write(&filepath, "ID,Ti").unwrap();

        let err = write_or_remove(
            BrokenWriter(ErrorKind::PermissionDenied),
            &filepath,
            &[case("TC001")],
        )
        .unwrap_err();

        assert!(matches!(err, StorageError::PermissionDenied));
        assert_eq!(
            err.to_string(),
            "Permission denied: Cannot write to output directory"
        );
        assert!(!filepath.exists());
    }

    #[test]
    fn test_failed_write_maps_other_errors() {
        let temp_dir = TempDir::new().unwrap();
        let filepath = temp_dir.path().join("full.csv");
        fs::write(&filepath, "").unwrap();

        let err = write_or_remove(BrokenWriter(ErrorKind::Other), &filepath, &[case("TC001")])
            .unwrap_err();

        assert!(matches!(err, StorageError::Write(_)));
        assert!(!filepath.exists());
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(temp_dir.path().join("out")).unwrap();
        fs::remove_dir_all(store.output_dir()).unwrap();

        let err = store.save(&[case("TC001")], "cases").unwrap_err();

        assert!(matches!(err, StorageError::Write(_)));
        assert!(store.list().is_empty());
    }

    // ============================================================================
    // lookup
    // ============================================================================

    #[test]
    fn test_resolve_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(temp_dir.path().join("out")).unwrap();
        fs::write(temp_dir.path().join("secret.csv"), "x").unwrap();

        assert!(matches!(
            store.resolve("../secret.csv"),
            Err(StorageError::NotFound)
        ));
        assert!(matches!(store.resolve(""), Err(StorageError::NotFound)));
        assert!(store.resolve("..").is_err());
    }

    #[test]
    fn test_list_newest_first_and_csv_only() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("a_20240101_120000.csv"), "").unwrap();
        fs::write(temp_dir.path().join("a_20240102_120000.csv"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        assert_eq!(
            store.list(),
            vec!["a_20240102_120000.csv", "a_20240101_120000.csv"]
        );
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(temp_dir.path()).unwrap();
        let saved = store.save(&[case("TC001")], "gone").unwrap();

        assert!(store.resolve(&saved.filename).is_ok());
        store.delete(&saved.filename).unwrap();
        assert!(store.resolve(&saved.filename).is_err());
        assert!(matches!(
            store.delete(&saved.filename),
            Err(StorageError::NotFound)
        ));
    }
}
