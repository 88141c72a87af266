//! Request fingerprints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::types::GenerateRequest;

/// Deterministic identity of a request: `{namespace}_{model}_{sha256}`.
///
/// The digest covers the namespace, resolved model, semantic input and the
/// serialized options. Object keys are sorted before hashing, so option order
/// never changes the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(namespace: &str, model: &str, input: &str, options: &Value) -> Self {
        let canonical = json!({
            "namespace": namespace,
            "model": model,
            "input": input,
            "options": options,
        });
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self(format!("{}_{}_{}", namespace, model, hash))
    }

    pub fn for_request(request: &GenerateRequest, model: &str) -> Self {
        Self::compute(
            request.namespace(),
            model,
            &request.identity_input(),
            &request.identity_options(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerationOptions;

    fn generate(prompt: &str, options: GenerationOptions) -> GenerateRequest {
        GenerateRequest::Generate {
            prompt: prompt.into(),
            options,
        }
    }

    #[test]
    fn test_shape_and_determinism() {
        let req = generate("hello", GenerationOptions::new().temperature(0.3));
        let a = Fingerprint::for_request(&req, "gemini-pro");
        let b = Fingerprint::for_request(&req, "gemini-pro");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("gemini_gemini-pro_"));
        assert_eq!(a.as_str().len(), "gemini_gemini-pro_".len() + 64);
    }

    #[test]
    fn test_each_component_changes_fingerprint() {
        let base = Fingerprint::for_request(&generate("hello", GenerationOptions::new()), "gemini-pro");
        assert_ne!(
            base,
            Fingerprint::for_request(&generate("hello!", GenerationOptions::new()), "gemini-pro")
        );
        assert_ne!(
            base,
            Fingerprint::for_request(&generate("hello", GenerationOptions::new()), "gemini-ultra")
        );
        assert_ne!(
            base,
            Fingerprint::for_request(
                &generate("hello", GenerationOptions::new().top_k(3)),
                "gemini-pro"
            )
        );
    }

    #[test]
    fn test_option_key_order_is_irrelevant() {
        let a = Fingerprint::compute("gemini", "m", "x", &json!({"a": 1, "b": 2}));
        let b = Fingerprint::compute("gemini", "m", "x", &json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }
}
