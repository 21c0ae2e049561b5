pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Read a request from `--input <file.json>`, falling back to piped stdin.
pub fn read_request<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(p) = path {
        return file::read_json(p);
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(value),
        None => Err(format!("--input <file.json> or stdin required for {what}").into()),
    }
}
