//! Compression request body

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateOptions {
    pub rate: f64,
}

/// Body of `POST /compress`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressRequest {
    pub prompt: String,
    pub model: String,
    /// Service-specific options block
    pub scaledown: RateOptions,
}

impl CompressRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>, rate: f64) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            scaledown: RateOptions { rate },
        }
    }

    pub fn rate(&self) -> f64 {
        self.scaledown.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let body = serde_json::to_value(CompressRequest::new("Hi", "gpt-4o", 0.5)).unwrap();
        assert_eq!(
            body,
            json!({ "prompt": "Hi", "model": "gpt-4o", "scaledown": { "rate": 0.5 } })
        );
    }
}
