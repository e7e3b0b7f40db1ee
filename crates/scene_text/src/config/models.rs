//! Supported Gemini model names

use phf::phf_set;

/// Models accepted by `ModelConfig::validate`
pub static SUPPORTED_MODELS: phf::Set<&'static str> = phf_set! {
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
};

/// Check whether a model name is in the supported list
pub fn is_supported_model(model_name: &str) -> bool {
    SUPPORTED_MODELS.contains(model_name)
}

/// Get the supported model names, sorted
pub fn list_supported_models() -> Vec<&'static str> {
    let mut models: Vec<&'static str> = SUPPORTED_MODELS.iter().copied().collect();
    models.sort_unstable();
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_model() {
        assert!(is_supported_model("gemini-1.5-pro"));
        assert!(!is_supported_model("gpt-4o-mini"));
        assert!(!is_supported_model(""));
    }

    #[test]
    fn test_list_supported_models_sorted() {
        let models = list_supported_models();
        assert_eq!(models.len(), SUPPORTED_MODELS.len());
        assert!(models.windows(2).all(|w| w[0] <= w[1]));
    }
}
