//! Endpoint resolution.

/// URL for `operation` on `model`.
///
/// A `models/`-qualified name is used verbatim. Otherwise the first catalog
/// entry equal to the name or ending in `/<name>` supplies the path, and
/// without one the bare name is appended to the base URL.
pub(crate) fn resolve_endpoint(
    base_url: &str,
    model: &str,
    operation: &str,
    catalog: Option<&[String]>,
) -> String {
    if model.starts_with("models/") {
        return format!("{}/{}:{}", base_url, model, operation);
    }

    if let Some(entry) = catalog.and_then(|names| find_entry(names, model)) {
        return format!("{}/{}:{}", base_url, entry, operation);
    }

    candidate_endpoints(base_url, model, operation)[0].clone()
}

/// The two literal URL shapes tried for a model missing from the catalog,
/// in order of preference.
pub fn candidate_endpoints(base_url: &str, model: &str, operation: &str) -> [String; 2] {
    [
        format!("{}/{}:{}", base_url, model, operation),
        format!("{}/models/{}:{}", base_url, model, operation),
    ]
}

fn find_entry<'a>(names: &'a [String], model: &str) -> Option<&'a str> {
    let suffix = format!("/{}", model);
    names
        .iter()
        .find(|name| name.as_str() == model || name.ends_with(&suffix))
        .map(String::as_str)
}
