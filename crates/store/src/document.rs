use std::path::Path;

use {
    serde::{Serialize, de::DeserializeOwned},
    tracing::warn,
};

use crate::error::Result;

/// Load a JSON document, returning the default when it is missing or cannot
/// be parsed.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read document, using empty");
            return T::default();
        },
    };
    match serde_json::from_str(&data) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt document, using empty");
            T::default()
        },
    }
}

/// Save a document atomically via temp file + rename.
pub fn save_atomic<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_string_pretty(doc)?;
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::collections::BTreeMap};

    #[test]
    fn missing_and_corrupt_load_as_default() {
        let tmp = tempfile::tempdir().unwrap();
        let missing: BTreeMap<String, u32> = load_or_default(&tmp.path().join("nope.json"));
        assert!(missing.is_empty());

        let corrupt = tmp.path().join("bad.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        let loaded: BTreeMap<String, u32> = load_or_default(&corrupt);
        assert!(loaded.is_empty());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/doc.json");
        let doc = BTreeMap::from([("a".to_string(), 1u32)]);
        save_atomic(&path, &doc).unwrap();

        let loaded: BTreeMap<String, u32> = load_or_default(&path);
        assert_eq!(loaded, doc);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
