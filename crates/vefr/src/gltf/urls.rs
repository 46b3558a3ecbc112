//! Storage provider URL rewriting and static asset path parsing.
//!
//! Exported payloads must not embed the absolute storage URL of the project
//! they were authored in. On export, `{storage_provider_url}/projects` is
//! replaced by [`PROJECT_TOKEN`]; on import the token is expanded against the
//! current provider.

use serde_json::Value;

pub const PROJECT_TOKEN: &str = "__$project$__";

/// Replace every occurrence of `from` with `to` inside the string values of
/// `value`, recursively. Object keys are left alone.
fn replace_in_strings(value: &mut Value, from: &str, to: &str) {
    match value {
        Value::String(s) => {
            if s.contains(from) {
                *s = s.replace(from, to);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| replace_in_strings(v, from, to)),
        Value::Object(map) => map.values_mut().for_each(|v| replace_in_strings(v, from, to)),
        _ => {}
    }
}

fn projects_prefix(storage_provider_url: &str) -> String {
    format!("{}/projects", storage_provider_url.trim_end_matches('/'))
}

/// Absolute project URLs → portable token.
pub fn clean_storage_provider_urls(value: &mut Value, storage_provider_url: &str) {
    replace_in_strings(value, &projects_prefix(storage_provider_url), PROJECT_TOKEN);
}

/// Portable token → absolute project URLs.
pub fn parse_storage_provider_urls(value: &mut Value, storage_provider_url: &str) {
    replace_in_strings(value, PROJECT_TOKEN, &projects_prefix(storage_provider_url));
}

/// A file inside a project's asset tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAssetPath {
    /// `<org>/<project>`
    pub project: String,
    pub relative_path: String,
}

/// Split `…/projects/<org>/<project>/<relative>` (or `static-resources`
/// in place of `projects`) into project name and relative path.
pub fn parse_static_asset_path(url: &str) -> Option<StaticAssetPath> {
    let rest = ["/projects/", "/static-resources/"]
        .iter()
        .filter_map(|marker| url.find(marker).map(|at| &url[at + marker.len()..]))
        .next()
        .or_else(|| {
            url.strip_prefix("projects/")
                .or_else(|| url.strip_prefix("static-resources/"))
        })?;

    let mut parts = rest.splitn(3, '/');
    let org = parts.next().filter(|s| !s.is_empty())?;
    let project = parts.next().filter(|s| !s.is_empty())?;
    let relative = parts.next().filter(|s| !s.is_empty())?;
    let relative = relative.split(['?', '#']).next().unwrap_or(relative);

    Some(StaticAssetPath {
        project: format!("{org}/{project}"),
        relative_path: relative.to_string(),
    })
}
