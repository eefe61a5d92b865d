use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "cloudsync",
    about = "Mirror a local directory tree into an object-storage container",
    version
)]
pub struct Cli {
    /// Absolute or relative path to the directory to upload
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Container the files are uploaded into
    #[arg(long)]
    pub bucket: Option<String>,

    /// Object store location (a directory, optionally written as file://<path>)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Storage identity, formatted as <tenant>:<username>
    #[arg(long)]
    pub identity: Option<String>,

    /// Storage password
    #[arg(long, env = "CLOUDSYNC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Prefix added to the key of every uploaded object
    #[arg(long)]
    pub prefix: Option<String>,

    /// Number of entries processed concurrently (reduce on 'too many open files')
    #[arg(long)]
    pub concurrent: Option<usize>,

    /// TOML file supplying defaults for any of the options above
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_flags() {
        let cli = Cli::try_parse_from([
            "cloudsync",
            "--dir",
            "./site",
            "--bucket",
            "web",
            "--endpoint",
            "file:///srv/objects",
            "--identity",
            "acme:deploy",
            "--password",
            "hunter2",
            "--prefix",
            "x/y",
            "--concurrent",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("./site")));
        assert_eq!(cli.bucket.as_deref(), Some("web"));
        assert_eq!(cli.endpoint.as_deref(), Some("file:///srv/objects"));
        assert_eq!(cli.identity.as_deref(), Some("acme:deploy"));
        assert_eq!(cli.password.as_deref(), Some("hunter2"));
        assert_eq!(cli.prefix.as_deref(), Some("x/y"));
        assert_eq!(cli.concurrent, Some(8));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn everything_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["cloudsync"]).unwrap();
        assert!(cli.dir.is_none());
        assert!(cli.concurrent.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["cloudsync", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["cloudsync", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn non_numeric_concurrency_is_rejected() {
        assert!(Cli::try_parse_from(["cloudsync", "--concurrent", "many"]).is_err());
    }
}
