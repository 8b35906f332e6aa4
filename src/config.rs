use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Env file read from the project root. Holds CLERK_SECRET_KEY for
/// production; its absence fails the run.
pub const ENV_FILE: &str = ".env.production.local";

const DEFAULT_DB_NAME: &str = "packzen-db";
const DEFAULT_CLERK_API_BASE: &str = "https://api.clerk.com";

/// Resolved configuration, built once at startup and passed by reference.
/// The process environment is never mutated.
#[derive(Clone, Debug)]
pub struct Config {
    pub clerk_secret_key: String,
    pub clerk_api_base: String,
    pub db_name: String,
    pub wrangler_bin: PathBuf,
}

impl Config {
    /// Loads `.env.production.local` from the project root and resolves all
    /// settings. File values take precedence over the process environment.
    pub fn load(project_root: &Path) -> AppResult<Self> {
        let env_file = project_root.join(ENV_FILE);
        if !env_file.exists() {
            return Err(AppError::Config(format!(
                "{} not found",
                env_file.display()
            )));
        }
        let vars = parse_env_file(&env_file)?;

        let clerk_secret_key = lookup(&vars, "CLERK_SECRET_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Config("CLERK_SECRET_KEY not set".to_string()))?;

        Ok(Config {
            clerk_secret_key,
            clerk_api_base: lookup(&vars, "CLERK_API_BASE")
                .unwrap_or_else(|| DEFAULT_CLERK_API_BASE.to_string()),
            db_name: lookup(&vars, "DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            wrangler_bin: find_wrangler(&vars, project_root),
        })
    }
}

/// Parses a KEY=VALUE env file into a map.
///
/// Blank lines and `#` comments are skipped; each remaining line splits on
/// the first `=` (a line without one yields an empty value); keys and values
/// are trimmed and one layer of matching quotes is stripped from the value.
/// Later duplicates overwrite earlier ones.
pub fn parse_env_file(path: &Path) -> AppResult<HashMap<String, String>> {
    let contents = fs::read_to_string(path)?;
    let mut vars = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key, value),
            None => (line, ""),
        };
        vars.insert(
            key.trim().to_string(),
            strip_quotes(value.trim()).to_string(),
        );
    }
    Ok(vars)
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn lookup(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).cloned().or_else(|| env::var(key).ok())
}

/// Resolves the wrangler binary: WRANGLER_BIN override, else the project's
/// local node_modules install, else whatever `wrangler` is on PATH.
fn find_wrangler(vars: &HashMap<String, String>, project_root: &Path) -> PathBuf {
    if let Some(bin) = lookup(vars, "WRANGLER_BIN") {
        return PathBuf::from(bin);
    }
    let local = project_root
        .join("node_modules")
        .join(".bin")
        .join("wrangler");
    if local.exists() {
        return local;
    }
    PathBuf::from("wrangler")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_env(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join(ENV_FILE);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_env_file_basic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(
            dir.path(),
            "# comment\n\nCLERK_SECRET_KEY=sk_live_abc\nDB_NAME = packzen-db \n",
        );

        let vars = parse_env_file(&path).unwrap();
        assert_eq!(vars["CLERK_SECRET_KEY"], "sk_live_abc");
        assert_eq!(vars["DB_NAME"], "packzen-db");
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_parse_env_file_strips_matching_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(
            dir.path(),
            "A=\"double\"\nB='single'\nC=\"mismatched'\nD=\"\"\n",
        );

        let vars = parse_env_file(&path).unwrap();
        assert_eq!(vars["A"], "double");
        assert_eq!(vars["B"], "single");
        assert_eq!(vars["C"], "\"mismatched'");
        assert_eq!(vars["D"], "");
    }

    #[test]
    fn test_parse_env_file_splits_on_first_equals() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(dir.path(), "URL=https://x.test/?a=1&b=2\nNOVALUE\n");

        let vars = parse_env_file(&path).unwrap();
        assert_eq!(vars["URL"], "https://x.test/?a=1&b=2");
        assert_eq!(vars["NOVALUE"], "");
    }

    #[test]
    fn test_parse_env_file_last_duplicate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(dir.path(), "KEY=first\nKEY=second\n");

        let vars = parse_env_file(&path).unwrap();
        assert_eq!(vars["KEY"], "second");
    }

    #[test]
    fn test_load_fails_without_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains(ENV_FILE)));
    }

    #[test]
    fn test_load_fails_without_secret_key() {
        let dir = tempfile::tempdir().unwrap();
        write_env(dir.path(), "DB_NAME=other-db\n");

        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("CLERK_SECRET_KEY")));
    }

    #[test]
    fn test_load_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_env(dir.path(), "CLERK_SECRET_KEY=sk_live_abc\n");

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.clerk_secret_key, "sk_live_abc");
        assert_eq!(config.clerk_api_base, "https://api.clerk.com");
        assert_eq!(config.db_name, "packzen-db");
        assert_eq!(config.wrangler_bin, PathBuf::from("wrangler"));
    }

    #[test]
    fn test_wrangler_bin_override() {
        let dir = tempfile::tempdir().unwrap();
        write_env(
            dir.path(),
            "CLERK_SECRET_KEY=sk_live_abc\nWRANGLER_BIN=/opt/bin/wrangler\n",
        );

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.wrangler_bin, PathBuf::from("/opt/bin/wrangler"));
    }

    #[test]
    fn test_wrangler_bin_prefers_local_install() {
        let dir = tempfile::tempdir().unwrap();
        write_env(dir.path(), "CLERK_SECRET_KEY=sk_live_abc\n");
        let bin_dir = dir.path().join("node_modules").join(".bin");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::File::create(bin_dir.join("wrangler")).unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.wrangler_bin, bin_dir.join("wrangler"));
    }
}
