//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["vibecation.toml", ".vibecation.toml"];
const ENV_PREFIX: &str = "VIBECATION_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `VIBECATION_`-prefixed environment variables (`VIBECATION_SERVER__BIND`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./vibecation.toml` or `./.vibecation.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/vibecation/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(Self::global_config_path(), Path::new("."), config_path)
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(
        global: Option<PathBuf>,
        project_dir: &Path,
        explicit: Option<&PathBuf>,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_in(project_dir) {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/vibecation/config.toml if set,
    /// otherwise falls back to ~/.config/vibecation/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vibecation").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_in(Path::new("."))
    }

    fn project_config_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Config files that would be read, in priority order (lowest first).
    pub fn config_sources(explicit: Option<&PathBuf>) -> Vec<(&'static str, PathBuf, bool)> {
        let mut sources = Vec::new();
        if let Some(path) = Self::global_config_path() {
            let found = path.exists();
            sources.push(("Global", path, found));
        }
        match Self::project_config_path() {
            Some(path) => sources.push(("Project", path, true)),
            None => sources.push(("Project", PathBuf::from(PROJECT_FILES[0]), false)),
        }
        if let Some(path) = explicit {
            sources.push(("Explicit", path.clone(), path.exists()));
        }
        sources
    }
}
