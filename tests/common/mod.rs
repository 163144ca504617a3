#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};
use topsis_rank::data::{Cell, RawTable};

/// Household file with loosely named headers, as typically exported by village offices.
pub const HOUSEHOLDS_CSV: &str = "\
No,RW,RT,Dusun/Desa,No NIK,Nama KK,Jml Tanggungan,Umur,Pekerjaan,Status Perkawinan
1,1,1,Krajan,3201010101010001,Sutrisno,4,62,1,3
2,1,2,Krajan,3201010101010002,Wagiman,2,35,4,1
3,2,1,Sidomulyo,3201010101010003,Suparmi,5,70,1,2
4,2,3,Sidomulyo,3201010101010004,Rohmat,1,28,5,1
";

/// Names of [`HOUSEHOLDS_CSV`] in expected ranking order.
pub const EXPECTED_ORDER: [&str; 4] = ["Suparmi", "Sutrisno", "Rohmat", "Wagiman"];

pub const CANONICAL_HEADER: &str =
    "RW,RT,Dusun,NIK,Nama Kepala Keluarga,Jumlah Tanggungan,Usia,Pekerjaan,Status";

/// Workbook holding [`HOUSEHOLDS_CSV`] as numeric cells on sheet `Warga`, and a
/// `Kosong` sheet whose second data row is blank.
pub fn workbook_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/warga.xlsx")
}

/// Builds a raw table with canonical headers from text rows.
pub fn canonical_raw(rows: &[[&str; 9]]) -> RawTable {
    let headers = CANONICAL_HEADER.split(',').map(str::to_string).collect();
    let rows = rows
        .iter()
        .map(|row| row.iter().map(|value| Cell::from_text(value)).collect())
        .collect();
    RawTable::new(headers, rows)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Files directly under `dir` (relative to the workspace) whose names start with `prefix`.
    pub fn files_with_prefix(&self, dir: &str, prefix: &str) -> Vec<PathBuf> {
        let root = self.temp_dir.path().join(dir);
        let Ok(entries) = std::fs::read_dir(&root) else {
            return Vec::new();
        };
        let mut found = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(prefix))
            })
            .collect::<Vec<_>>();
        found.sort();
        found
    }
}
