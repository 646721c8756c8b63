//! Generation model selection.

use super::gemini::ModelInfo;

/// Models preferred in order when discovery succeeds.
pub const PREFERRED_MODELS: &[&str] = &[
    "models/gemini-1.5-flash",
    "models/gemini-1.5-pro",
    "models/gemini-pro",
];

/// Model used when discovery fails or finds nothing usable.
pub const DEFAULT_MODEL: &str = "models/gemini-pro";

/// Ensure a model name carries the `models/` prefix.
pub fn normalize_model_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{name}")
    }
}

/// Choose a model from a discovery listing.
///
/// Only models supporting `generateContent` are considered. The first entry of
/// [`PREFERRED_MODELS`] present wins; otherwise the first model whose name
/// contains `gemini`; otherwise [`DEFAULT_MODEL`]. The result is a pure
/// function of the listing.
pub fn select_model(models: &[ModelInfo]) -> String {
    let available: Vec<String> = models
        .iter()
        .filter(|m| m.supports_generate_content())
        .map(|m| normalize_model_name(&m.name))
        .collect();

    if let Some(preferred) = PREFERRED_MODELS
        .iter()
        .find(|p| available.iter().any(|name| name.as_str() == **p))
    {
        return (*preferred).to_string();
    }

    available
        .into_iter()
        .find(|name| name.contains("gemini"))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}
