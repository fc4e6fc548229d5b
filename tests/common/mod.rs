//! Test utilities and a mock host bundler for the inline-scripts test suite

#![allow(dead_code)]

use kodegen_tools_inline_scripts::{
    ChunkHandle, EmitChunk, HostError, OutputBundle, OutputChunk, PluginContext, Registry,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;
use xxhash_rust::xxh3::xxh3_64;

/// Route `log` output through the test harness; safe to call repeatedly
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build root and output directory for one test build
pub struct TestProject {
    pub root: TempDir,
    pub out: TempDir,
}

impl TestProject {
    /// Create a project whose root contains `files` and whose entry HTML is `html`
    ///
    /// The HTML is also copied to the output directory, as a host build would.
    pub fn new(html: &str, files: &[(&str, &str)]) -> Self {
        init_logging();
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        for (name, content) in files {
            let path = root.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
        std::fs::write(root.path().join("index.html"), html).unwrap();
        std::fs::write(out.path().join("index.html"), html).unwrap();
        Self { root, out }
    }

    /// Built HTML as it currently sits in the output directory
    pub fn built_html(&self) -> String {
        std::fs::read_to_string(self.out.path().join("index.html")).unwrap()
    }

    /// Every file under the output directory, relative and `/`-separated
    pub fn output_files(&self) -> Vec<String> {
        fn walk(dir: &Path, base: &Path, files: &mut Vec<String>) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(&path, base, files);
                } else {
                    let relative = path.strip_prefix(base).unwrap();
                    files.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        let mut files = Vec::new();
        walk(self.out.path(), self.out.path(), &mut files);
        files.sort();
        files
    }
}

/// In-memory host bundler
///
/// Emitted units are loaded back through the registry, "minified" by
/// collapsing whitespace when both the host and the unit ask for it, written to `assets/<name>-<hash>.js`
/// and listed in `.vite/manifest.json`.
#[derive(Default)]
pub struct MockHost {
    minify: bool,
    emitted: Mutex<Vec<(ChunkHandle, EmitChunk)>>,
    file_names: Mutex<HashMap<ChunkHandle, String>>,
}

impl MockHost {
    pub fn new(minify: bool) -> Self {
        Self {
            minify,
            ..Self::default()
        }
    }

    pub fn emitted_ids(&self) -> Vec<String> {
        self.emitted
            .lock()
            .iter()
            .map(|(_, chunk)| chunk.id.clone())
            .collect()
    }

    /// Process every emitted unit and write the results into `out_dir`
    pub async fn process(&self, registry: &Registry, out_dir: &Path) -> OutputBundle {
        let emitted = self.emitted.lock().clone();
        let mut bundle = OutputBundle::new();
        let mut manifest = serde_json::Map::new();
        manifest.insert(
            "index.html".to_string(),
            serde_json::json!({ "file": "index.html", "isEntry": true }),
        );

        for (handle, chunk) in emitted {
            let Some(id) = registry.resolve_id(&chunk.id) else {
                continue;
            };
            let code = match registry.load(&id).await {
                Some(Ok(code)) => code,
                // The unit fails to load and is dropped from the build
                _ => continue,
            };
            let code = if self.minify && chunk.minify {
                code.split_whitespace().collect::<Vec<_>>().join(" ")
            } else {
                code
            };

            let name = chunk.name.clone().unwrap_or_else(|| "chunk".to_string());
            let file_name = format!("assets/{name}-{:08x}.js", xxh3_64(id.as_bytes()) as u32);
            let path = out_dir.join(&file_name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, &code).unwrap();

            manifest.insert(id.clone(), serde_json::json!({ "file": file_name }));
            self.file_names.lock().insert(handle, file_name.clone());
            bundle.insert(OutputChunk {
                file_name,
                code,
                facade_module_id: Some(id),
            });
        }

        let manifest_path = out_dir.join(".vite/manifest.json");
        std::fs::create_dir_all(manifest_path.parent().unwrap()).unwrap();
        std::fs::write(
            manifest_path,
            serde_json::to_string_pretty(&serde_json::Value::Object(manifest)).unwrap(),
        )
        .unwrap();

        bundle
    }
}

impl PluginContext for MockHost {
    fn emit_chunk(&self, chunk: EmitChunk) -> Result<ChunkHandle, HostError> {
        let mut emitted = self.emitted.lock();
        let handle = ChunkHandle::new(format!("ref-{}", emitted.len()));
        emitted.push((handle.clone(), chunk));
        Ok(handle)
    }

    fn file_name(&self, handle: &ChunkHandle) -> Result<String, HostError> {
        self.file_names
            .lock()
            .get(handle)
            .cloned()
            .ok_or_else(|| HostError::UnknownHandle(handle.to_string()))
    }
}
