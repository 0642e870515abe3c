use std::path::Path;

use hearth::config::Config;
use hearth::storage::Storage;
use tempfile::TempDir;

/// A temporary data directory with an initialized layout and a fixed
/// household timezone, so test expectations don't depend on the machine.
pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let data = Self { dir };
        data.storage().init().expect("init storage");
        data.write_config("timezone = \"America/New_York\"\n");
        data
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn storage(&self) -> Storage {
        Storage::new(self.dir.path().to_path_buf())
    }

    pub fn config(&self) -> Config {
        Config::load_from(&self.storage())
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.storage().config_file(), contents).expect("write config");
    }
}
