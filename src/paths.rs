use std::path::{Path, PathBuf};

/// Filesystem layout for one showcase site: the README being patched
/// and the assets directory holding normalized cover images.
#[derive(Debug, Clone)]
pub struct SitePaths {
    pub base_dir: PathBuf,
}

impl SitePaths {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn readme_path(&self) -> PathBuf {
        self.base_dir.join("README.md")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.base_dir.join("assets")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.base_dir.join("config")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir().join("refresh_settings.json")
    }

    /// Extension-less path for a logical asset; the normalizer decides
    /// the extension from the actual bytes.
    pub fn asset_stem(&self, stem: &str) -> PathBuf {
        self.assets_dir().join(stem)
    }

    /// README-relative reference for an on-disk asset file name.
    pub fn asset_rel_ref(&self, file_name: &str) -> String {
        format!("assets/{file_name}")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.assets_dir())?;
        std::fs::create_dir_all(self.config_dir())?;
        Ok(())
    }

    pub fn normalize_base_dir(base_dir: &Path) -> PathBuf {
        base_dir.to_path_buf()
    }
}
