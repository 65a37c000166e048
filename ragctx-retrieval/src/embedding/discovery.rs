//! Model cache discovery
//!
//! Finds the directory fastembed should load model files from.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Find the model cache directory with priority:
/// 1. Explicitly configured directory
/// 2. RAGCTX_MODELS_PATH environment variable
/// 3. FASTEMBED_CACHE_DIR environment variable
/// 4. User home directory (~/.ragctx/models)
/// 5. `.fastembed_cache` in the working directory
pub fn resolve_cache_dir(explicit: Option<&Path>) -> PathBuf {
    resolve_with(explicit, |key| std::env::var_os(key))
}

fn resolve_with(explicit: Option<&Path>, env: impl Fn(&str) -> Option<OsString>) -> PathBuf {
    if let Some(dir) = explicit {
        log::info!("Using configured model cache: {}", dir.display());
        return dir.to_path_buf();
    }

    if let Some(dir) = env("RAGCTX_MODELS_PATH").filter(|v| !v.is_empty()) {
        let path = PathBuf::from(dir);
        log::info!("Using RAGCTX_MODELS_PATH: {}", path.display());
        return path;
    }

    if let Some(dir) = env("FASTEMBED_CACHE_DIR").filter(|v| !v.is_empty()) {
        let path = PathBuf::from(dir);
        log::info!("Using FASTEMBED_CACHE_DIR: {}", path.display());
        return path;
    }

    if let Some(home) = env("HOME").or_else(|| env("USERPROFILE")) {
        return PathBuf::from(home).join(".ragctx").join("models");
    }

    PathBuf::from(".fastembed_cache")
}

/// Whether the HuggingFace cache layout under `cache_dir` already holds `model_id`
///
/// Only used to tell the operator a download is about to happen.
pub fn has_cached_model(cache_dir: &Path, model_id: &str) -> bool {
    let repo_dir = format!("models--{}", model_id.replace('/', "--"));
    cache_dir.join(repo_dir).join("snapshots").is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_explicit_dir_wins() {
        let dir = resolve_with(
            Some(Path::new("/opt/models")),
            env_of(&[("RAGCTX_MODELS_PATH", "/env/models")]),
        );
        assert_eq!(dir, PathBuf::from("/opt/models"));
    }

    #[test]
    fn test_env_priority() {
        let dir = resolve_with(
            None,
            env_of(&[
                ("RAGCTX_MODELS_PATH", "/env/ragctx"),
                ("FASTEMBED_CACHE_DIR", "/env/fastembed"),
            ]),
        );
        assert_eq!(dir, PathBuf::from("/env/ragctx"));

        let dir = resolve_with(None, env_of(&[("FASTEMBED_CACHE_DIR", "/env/fastembed")]));
        assert_eq!(dir, PathBuf::from("/env/fastembed"));
    }

    #[test]
    fn test_home_fallback() {
        let dir = resolve_with(None, env_of(&[("HOME", "/home/ana")]));
        assert_eq!(dir, PathBuf::from("/home/ana/.ragctx/models"));

        let dir = resolve_with(None, env_of(&[]));
        assert_eq!(dir, PathBuf::from(".fastembed_cache"));
    }

    #[test]
    fn test_has_cached_model() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(!has_cached_model(tmp.path(), "intfloat/multilingual-e5-small"));

        std::fs::create_dir_all(
            tmp.path()
                .join("models--intfloat--multilingual-e5-small")
                .join("snapshots"),
        )
        .unwrap();
        assert!(has_cached_model(tmp.path(), "intfloat/multilingual-e5-small"));
    }
}
