//! ファイルによるスナップショットストア
//!
//! キーごとに `<key>.json` を1ファイル保存する。
//! 書き込みは一時ファイル経由で置き換える。

use label_validator_common::{Error, SnapshotStore};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// キーに対応するファイルパス
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> Error {
    Error::Storage(format!("{}: {}", path.display(), e))
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> label_validator_common::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| storage_error(&path, e))
    }

    fn set(&mut self, key: &str, value: &str) -> label_validator_common::Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| storage_error(&self.dir, e))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| storage_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| storage_error(&path, e))?;
        Ok(())
    }
}
