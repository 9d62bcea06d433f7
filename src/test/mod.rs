use std::{ffi::OsStr, fs::File, path::PathBuf};

use serde::de::DeserializeOwned;

/// Deserializes every JSON file under `src/test/spec/json/<spec>/` and feeds
/// it to `run_test_file`.
pub(crate) fn run_spec_test<T, F>(spec: &[&str], run_test_file: F)
where
    F: Fn(T),
    T: DeserializeOwned,
{
    let base_path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "src", "test", "spec", "json"]
        .iter()
        .chain(spec.iter())
        .collect();

    for entry in std::fs::read_dir(&base_path).unwrap_or_else(|_| panic!("reading {:?}", base_path))
    {
        let test_file = entry.unwrap();

        if !test_file.file_type().unwrap().is_file() {
            continue;
        }

        let path = test_file.path();
        if path.extension().and_then(OsStr::to_str) != Some("json") {
            continue;
        }

        let file = File::open(&path).unwrap_or_else(|_| panic!("opening {:?}", path));
        let parsed: T = serde_json::from_reader(file)
            .unwrap_or_else(|error| panic!("parsing {:?}: {}", path, error));
        run_test_file(parsed);
    }
}
