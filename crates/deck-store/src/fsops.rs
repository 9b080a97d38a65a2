//! Retrying filesystem primitives shared across the store.
//!
//! Directory creation and text writes go through a bounded retry (3
//! attempts, 50 ms apart) to absorb short-lived OS races such as a
//! directory handle being torn down by an external process. This is
//! resilience against transient interference, not a concurrency primitive.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Run `op` up to [`RETRY_ATTEMPTS`] times with a fixed delay between
/// attempts, returning the last error when the budget is exhausted.
pub fn with_retry<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last = None;
    for attempt in 1..=RETRY_ATTEMPTS {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt < RETRY_ATTEMPTS {
                    tracing::debug!("transient I/O failure (attempt {attempt}): {e}");
                    std::thread::sleep(RETRY_DELAY);
                }
                last = Some(e);
            }
        }
    }
    Err(last.unwrap_or_else(|| io::Error::other("retry budget exhausted")))
}

pub fn create_dir_retry(path: &Path) -> io::Result<()> {
    with_retry(|| fs::create_dir_all(path))
}

pub fn write_text_retry(path: &Path, content: &str) -> io::Result<()> {
    with_retry(|| fs::write(path, content))
}

/// Deep-copy `src` into `dst`, including hidden entries. `dst` is created.
/// A mid-copy failure leaves a partially populated destination; callers do
/// not get automatic cleanup.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    create_dir_retry(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Total size in bytes of all files under `path`, recursively.
pub fn dir_size(path: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

/// Read the value of `key` from a `KEY=VALUE` env file. `None` when the
/// file or the key is absent.
pub fn read_env_var(env_file: &Path, key: &str) -> io::Result<Option<String>> {
    if !env_file.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(env_file)?;
    for line in content.lines() {
        if let Some(value) = line.strip_prefix(key).and_then(|r| r.strip_prefix('=')) {
            return Ok(Some(value.to_owned()));
        }
    }
    Ok(None)
}

/// Set `key` to `value` in a `KEY=VALUE` env file, replacing an existing
/// line or appending one. A missing file is created.
pub fn set_env_var(env_file: &Path, key: &str, value: &str) -> io::Result<()> {
    let content = if env_file.exists() {
        fs::read_to_string(env_file)?
    } else {
        String::new()
    };

    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;
    for line in content.lines() {
        if line.strip_prefix(key).is_some_and(|r| r.starts_with('=')) {
            lines.push(format!("{key}={value}"));
            replaced = true;
        } else {
            lines.push(line.to_owned());
        }
    }
    if !replaced {
        lines.push(format!("{key}={value}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    write_text_retry(env_file, &out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_returns_first_success() {
        let mut calls = 0;
        let result = with_retry(|| {
            calls += 1;
            Ok::<_, io::Error>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn retry_recovers_from_transient_failure() {
        let mut calls = 0;
        let result = with_retry(|| {
            calls += 1;
            if calls < 3 {
                Err(io::Error::other("transient"))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 3);
    }

    #[test]
    fn retry_gives_up_after_budget() {
        let mut calls = 0;
        let result: io::Result<()> = with_retry(|| {
            calls += 1;
            Err(io::Error::other("persistent"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn copy_includes_hidden_files_and_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join(".env"), "PROJECT_NAME=a\n").unwrap();
        fs::write(src.join("nested").join("file.txt"), "data").unwrap();

        let dst = dir.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join(".env")).unwrap(), "PROJECT_NAME=a\n");
        assert_eq!(
            fs::read_to_string(dst.join("nested").join("file.txt")).unwrap(),
            "data"
        );
    }

    #[test]
    fn dir_size_sums_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a"), [0u8; 10]).unwrap();
        fs::write(dir.path().join("sub").join("b"), [0u8; 32]).unwrap();
        assert_eq!(dir_size(dir.path()).unwrap(), 42);
    }

    #[test]
    fn set_env_var_replaces_existing_line() {
        let dir = tempfile::tempdir().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "PROJECT_NAME=old\nPORT=8080\n").unwrap();

        set_env_var(&env, "PROJECT_NAME", "new-name").unwrap();

        assert_eq!(
            read_env_var(&env, "PROJECT_NAME").unwrap().as_deref(),
            Some("new-name")
        );
        assert_eq!(read_env_var(&env, "PORT").unwrap().as_deref(), Some("8080"));
    }

    #[test]
    fn set_env_var_appends_missing_line() {
        let dir = tempfile::tempdir().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "PORT=8080\n").unwrap();

        set_env_var(&env, "PROJECT_NAME", "web-001").unwrap();

        let content = fs::read_to_string(&env).unwrap();
        assert!(content.contains("PORT=8080"));
        assert!(content.contains("PROJECT_NAME=web-001"));
    }

    #[test]
    fn set_env_var_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let env = dir.path().join(".env");
        set_env_var(&env, "PROJECT_NAME", "fresh").unwrap();
        assert_eq!(
            read_env_var(&env, "PROJECT_NAME").unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn read_env_var_does_not_match_prefix_keys() {
        let dir = tempfile::tempdir().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "PROJECT_NAME_EXTRA=x\nPROJECT_NAME=y\n").unwrap();
        assert_eq!(
            read_env_var(&env, "PROJECT_NAME").unwrap().as_deref(),
            Some("y")
        );
    }

    #[test]
    fn read_env_var_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_env_var(&dir.path().join(".env"), "KEY")
            .unwrap()
            .is_none());
    }
}
