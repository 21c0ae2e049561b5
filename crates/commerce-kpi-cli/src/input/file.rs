use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

enum Format {
    Json,
    Yaml,
}

/// Read a JSON request file.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    read_as(path, Format::Json)
}

/// Read a settings file: YAML for .yaml/.yml, JSON otherwise.
pub fn read_structured<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let format = match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Format::Yaml,
        _ => Format::Json,
    };
    read_as(path, format)
}

fn read_as<T: DeserializeOwned>(
    path: &str,
    format: Format,
) -> Result<T, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    let parsed = match format {
        Format::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| format!("Failed to parse '{}': {}", resolved.display(), e).into())
}

/// Resolve against the working directory; the target must be an existing file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let resolved = std::env::current_dir()?.join(path);
    if !resolved.is_file() {
        let problem = if resolved.exists() { "Not a file" } else { "File not found" };
        return Err(format!("{}: {}", problem, resolved.display()).into());
    }
    Ok(resolved)
}
