// Static reference catalogs (formations, route concepts) read from disk.

use std::path::Path;

pub const FORMATIONS_FILE: &str = "formations.json";
pub const CONCEPTS_FILE: &str = "route_concepts.json";

/// Load a catalog file as a JSON array. Any read or parse failure degrades to
/// an empty list; catalog lookups never error.
pub fn load_catalog(dir: &Path, file: &str) -> Vec<serde_json::Value> {
    let path = dir.join(file);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Catalog {} unreadable, serving empty list: {e}", path.display());
            return Vec::new();
        }
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Array(items)) => items,
        Ok(_) => {
            tracing::warn!("Catalog {} is not a JSON array, serving empty list", path.display());
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Catalog {} unparsable, serving empty list: {e}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_file_is_empty() {
        let items = load_catalog(&PathBuf::from("/nonexistent"), FORMATIONS_FILE);
        assert!(items.is_empty());
    }

    #[test]
    fn test_bundled_catalogs_load() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/catalogs");
        let formations = load_catalog(&dir, FORMATIONS_FILE);
        assert!(!formations.is_empty());
        assert!(formations[0].get("name").is_some());

        let concepts = load_catalog(&dir, CONCEPTS_FILE);
        assert!(!concepts.is_empty());
    }

    #[test]
    fn test_non_array_json_is_empty() {
        let dir = std::env::temp_dir().join("coachgrind-catalog-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("bad.json"), "{\"not\": \"an array\"}").unwrap();
        assert!(load_catalog(&dir, "bad.json").is_empty());
    }
}
