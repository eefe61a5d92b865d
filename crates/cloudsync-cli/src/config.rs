use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use cloudsync_engine::{SyncConfig, DEFAULT_WORKERS};
use cloudsync_store::Credentials;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Backend location used when neither a flag nor the config file names one.
pub const DEFAULT_ENDPOINT: &str = "file://./cloudsync-objects";

/// Defaults read from `--config <file.toml>`. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub dir: Option<PathBuf>,
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    pub identity: Option<String>,
    pub password: Option<String>,
    pub prefix: Option<String>,
    pub concurrent: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }
}

/// Fully resolved run settings: flags first, then the config file, then
/// built-in defaults.
#[derive(Clone, Debug)]
pub struct Settings {
    pub dir: PathBuf,
    pub credentials: Credentials,
    pub sync: SyncConfig,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: FileConfig) -> anyhow::Result<Self> {
        let dir = cli.dir.clone().or(file.dir);
        let bucket = cli.bucket.clone().or(file.bucket);
        let identity = cli.identity.clone().or(file.identity);
        let password = cli.password.clone().or(file.password);

        let (Some(dir), Some(bucket), Some(identity), Some(password)) =
            (dir, bucket, identity, password)
        else {
            bail!("'dir', 'bucket', 'identity' and 'password' are required");
        };

        let endpoint = cli
            .endpoint
            .clone()
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let credentials = Credentials::from_identity(endpoint, &identity, password)?;

        let mut sync = SyncConfig::new(bucket)
            .with_workers(cli.concurrent.or(file.concurrent).unwrap_or(DEFAULT_WORKERS));
        if let Some(prefix) = cli.prefix.clone().or(file.prefix) {
            sync = sync.with_prefix(prefix);
        }

        Ok(Self {
            dir,
            credentials,
            sync,
        })
    }
}
