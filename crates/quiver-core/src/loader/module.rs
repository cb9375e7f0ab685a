//! Reading a module manifest into a JSON value.
//!
//! `.toml` files are parsed as TOML, anything else as JSON. A top-level
//! `default` table is unwrapped, repeatedly. An `imports` list names other
//! manifests, relative to the importing file, whose keys are merged in
//! underneath the importer's own.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::{ModuleError, ModuleResult};
use crate::loader::LoadStrategy;
use crate::probe;

/// Load the module at `path`.
///
/// Returns `Ok(None)` when the file evaluates to `null`.
pub async fn load(path: &Path, strategy: LoadStrategy) -> ModuleResult<Option<Value>> {
    if probe::is_blank(path) {
        return Err(ModuleError::PathRequired);
    }
    if !probe::is_file(path) {
        return Err(ModuleError::NotAFile(path.to_path_buf()));
    }

    let mut visited = HashSet::from([path.to_path_buf()]);
    let value = load_resolved(path.to_path_buf(), strategy, &mut visited).await?;
    Ok(match value {
        Value::Null => None,
        value => Some(value),
    })
}

fn load_resolved(
    path: PathBuf,
    strategy: LoadStrategy,
    visited: &mut HashSet<PathBuf>,
) -> BoxFuture<'_, ModuleResult<Value>> {
    Box::pin(async move {
        let source = read_source(&path, strategy).await?;
        let mut value = unwrap_default(parse_source(&path, &source)?);

        for import in take_imports(&path, &mut value)? {
            let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
            let target = base_dir.join(&import);
            if !probe::is_file(&target) {
                return Err(ModuleError::DependencyNotFound {
                    path: path.clone(),
                    dependency: import,
                });
            }
            if !visited.insert(target.clone()) {
                continue;
            }
            let base = load_resolved(target, strategy, visited).await?;
            merge_under(&mut value, base);
        }

        Ok(value)
    })
}

async fn read_source(path: &Path, strategy: LoadStrategy) -> ModuleResult<String> {
    let read = match strategy {
        LoadStrategy::Blocking => std::fs::read_to_string(path),
        LoadStrategy::Async => tokio::fs::read_to_string(path).await,
    };
    read.map_err(|source| ModuleError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse manifest text according to the file extension.
pub fn parse_source(path: &Path, source: &str) -> ModuleResult<Value> {
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let parsed = if is_toml {
        toml::from_str::<Value>(source).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(source).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| ModuleError::Evaluation {
        path: path.to_path_buf(),
        message,
    })
}

/// Peel off `default` wrappers: `{ default = { default = X } }` becomes `X`.
pub fn unwrap_default(mut value: Value) -> Value {
    loop {
        match value {
            Value::Object(mut map) if map.get("default").is_some_and(Value::is_object) => {
                value = map.remove("default").unwrap_or(Value::Null);
            }
            other => return other,
        }
    }
}

fn take_imports(path: &Path, value: &mut Value) -> ModuleResult<Vec<String>> {
    let Some(imports) = value.as_object_mut().and_then(|map| map.remove("imports")) else {
        return Ok(Vec::new());
    };

    let invalid = || ModuleError::Evaluation {
        path: path.to_path_buf(),
        message: "\"imports\" must be a list of relative paths".to_string(),
    };

    match imports {
        Value::String(single) => Ok(vec![single]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

/// Keys of `base` missing from `value` are copied in.
fn merge_under(value: &mut Value, base: Value) {
    if let (Value::Object(target), Value::Object(base)) = (value, base) {
        for (key, v) in base {
            target.entry(key).or_insert(v);
        }
    }
}
