//! Model and index discovery.
//!
//! Scans a weights directory for voice models and an index directory for
//! retrieval indices, and pairs a selected model with its index file by
//! name. A missing directory is treated as "nothing available", never as
//! an error.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{info, warn};
use walkdir::WalkDir;

/// File extensions recognized as voice models.
pub const MODEL_EXTENSIONS: &[&str] = &["pth", "onnx"];

/// File extension recognized as a retrieval index.
pub const INDEX_EXTENSION: &str = "index";

/// A discovered voice model, identified by its filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    file_name: String,
    path: PathBuf,
}

impl ModelRef {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename without the model extension, used for index pairing.
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }
}

/// Lists models in `dir` (non-recursive). A missing or unreadable
/// directory yields an empty list.
pub fn scan_models(dir: &Path) -> Vec<ModelRef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            warn!("weights directory {} not readable, no models available", dir.display());
            return Vec::new();
        }
    };

    let mut models: Vec<ModelRef> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, MODEL_EXTENSIONS))
        .filter_map(|path| {
            let file_name = path.file_name()?.to_str()?.to_string();
            Some(ModelRef { file_name, path })
        })
        .collect();

    // Directory order is filesystem-dependent; sort for a stable UI list.
    models.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    info!("found {} model(s) in {}", models.len(), dir.display());
    models
}

/// Recursively collects `.index` files under `dir`, in walk order.
pub fn scan_indices(dir: &Path) -> Vec<PathBuf> {
    let indices: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && has_extension(path, &[INDEX_EXTENSION]))
        .collect();
    info!("found {} index file(s) under {}", indices.len(), dir.display());
    indices
}

/// Pairs a model with an index file by name.
///
/// Exact stem matches (`singerA.index`, `singerA_v2.index`) are preferred
/// over the looser substring fallback; within either tier the first index
/// in walk order wins, and additional candidates are reported rather than
/// silently dropped.
pub fn resolve_index<'a>(model: &ModelRef, indices: &'a [PathBuf]) -> Option<&'a Path> {
    let stem = model.stem();

    let exact: Vec<&PathBuf> = indices
        .iter()
        .filter(|path| stem_matches(path, stem))
        .collect();
    if let Some(first) = exact.first() {
        if exact.len() > 1 {
            warn!(
                "{} index files match model `{}` exactly, using {}",
                exact.len(),
                model.file_name(),
                first.display()
            );
        }
        return Some(first.as_path());
    }

    indices
        .iter()
        .find(|path| path.to_string_lossy().contains(stem))
        .map(PathBuf::as_path)
}

fn stem_matches(index: &Path, model_stem: &str) -> bool {
    let Some(index_stem) = index.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    index_stem == model_stem
        || index_stem
            .strip_prefix(model_stem)
            .is_some_and(|rest| rest.starts_with('_'))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
}

/// Cached view of the weights and index directories.
pub struct Registry {
    weight_root: PathBuf,
    index_root: PathBuf,
    models: RwLock<Vec<ModelRef>>,
    indices: RwLock<Vec<PathBuf>>,
}

impl Registry {
    /// Scans both roots and returns the populated registry.
    pub fn discover(weight_root: PathBuf, index_root: PathBuf) -> Self {
        let registry = Self {
            weight_root,
            index_root,
            models: RwLock::new(Vec::new()),
            indices: RwLock::new(Vec::new()),
        };
        registry.refresh();
        registry
    }

    /// Re-scans both directory trees.
    pub fn refresh(&self) {
        *self.models.write() = scan_models(&self.weight_root);
        *self.indices.write() = scan_indices(&self.index_root);
    }

    pub fn weight_root(&self) -> &Path {
        &self.weight_root
    }

    pub fn index_root(&self) -> &Path {
        &self.index_root
    }

    pub fn models(&self) -> Vec<ModelRef> {
        self.models.read().clone()
    }

    pub fn indices(&self) -> Vec<PathBuf> {
        self.indices.read().clone()
    }

    /// Looks a scanned model up by filename.
    pub fn model(&self, file_name: &str) -> Option<ModelRef> {
        self.models
            .read()
            .iter()
            .find(|model| model.file_name == file_name)
            .cloned()
    }

    /// Resolves the index paired with a model, if any.
    pub fn index_for(&self, model: &ModelRef) -> Option<PathBuf> {
        let indices = self.indices.read();
        resolve_index(model, &indices).map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn model(name: &str) -> ModelRef {
        ModelRef {
            file_name: name.to_string(),
            path: PathBuf::from(name),
        }
    }

    #[test]
    fn missing_weights_directory_yields_no_models() {
        let models = scan_models(Path::new("/nonexistent/weights"));
        assert!(models.is_empty());
    }

    #[test]
    fn scan_models_filters_by_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("singerA.pth"), b"w").unwrap();
        fs::write(dir.path().join("singerB.onnx"), b"w").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();

        let models = scan_models(dir.path());
        let names: Vec<&str> = models.iter().map(ModelRef::file_name).collect();
        assert_eq!(names, ["singerA.pth", "singerB.onnx"]);
    }

    #[test]
    fn scan_indices_walks_subdirectories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("archive")).unwrap();
        fs::write(dir.path().join("archive/singerA_v2.index"), b"i").unwrap();
        fs::write(dir.path().join("readme.md"), b"r").unwrap();

        let indices = scan_indices(dir.path());
        assert_eq!(indices.len(), 1);
        assert!(indices[0].ends_with("archive/singerA_v2.index"));
    }

    #[test]
    fn resolves_versioned_index_in_subdirectory() {
        let indices = vec![PathBuf::from("archive/singerA_v2.index")];
        let found = resolve_index(&model("singerA.pth"), &indices);
        assert_eq!(found, Some(Path::new("archive/singerA_v2.index")));
    }

    #[test]
    fn returns_none_without_a_name_match() {
        let indices = vec![PathBuf::from("archive/other.index")];
        assert_eq!(resolve_index(&model("singerA.pth"), &indices), None);
    }

    #[test]
    fn exact_stem_beats_substring_elsewhere_in_list() {
        // "singer2" contains "singer" as a substring; the exact stem for
        // "singer.pth" must still win even when listed later.
        let indices = vec![
            PathBuf::from("singer2.index"),
            PathBuf::from("singer.index"),
        ];
        let found = resolve_index(&model("singer.pth"), &indices);
        assert_eq!(found, Some(Path::new("singer.index")));
    }

    #[test]
    fn substring_fallback_takes_first_in_walk_order() {
        let indices = vec![
            PathBuf::from("packA/singerA-final.index"),
            PathBuf::from("packB/singerA-old.index"),
        ];
        let found = resolve_index(&model("singerA.pth"), &indices);
        assert_eq!(found, Some(Path::new("packA/singerA-final.index")));
    }

    #[test]
    fn registry_pairs_model_with_index() {
        let weights = tempdir().unwrap();
        let indexes = tempdir().unwrap();
        fs::write(weights.path().join("singerA.pth"), b"w").unwrap();
        fs::create_dir_all(indexes.path().join("archive")).unwrap();
        fs::write(indexes.path().join("archive/singerA_v2.index"), b"i").unwrap();

        let registry = Registry::discover(
            weights.path().to_path_buf(),
            indexes.path().to_path_buf(),
        );
        let model = registry.model("singerA.pth").expect("model scanned");
        let index = registry.index_for(&model).expect("index resolved");
        assert!(index.ends_with("archive/singerA_v2.index"));
    }
}
