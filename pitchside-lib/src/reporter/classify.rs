use crate::Error;

/// Coarse category of a failed remote model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    ModelNotFound,
    Authentication,
    RateLimit,
    Unexpected,
}

impl ProviderFailure {
    /// Categorize by the provider's error codes in the rendered error.
    pub fn classify(error: &Error) -> Self {
        let text = error.to_string();
        let has = |needle: &str| text.contains(needle);

        if has("model_not_found") || has("model_decommissioned") || has("does not exist") {
            Self::ModelNotFound
        } else if has("authentication_error") || has("invalid_api_key") {
            Self::Authentication
        } else if has("rate_limit_exceeded") {
            Self::RateLimit
        } else {
            Self::Unexpected
        }
    }

    /// Message shown to the user in place of the error.
    pub fn message(self) -> &'static str {
        match self {
            Self::ModelNotFound => {
                "The configured language model is not available. Please check the model name."
            }
            Self::Authentication => {
                "Authentication with the language model provider failed. Please check your API key."
            }
            Self::RateLimit => {
                "The language model provider is rate limiting requests. \
                 Please wait a moment and try again."
            }
            Self::Unexpected => {
                "An unexpected error occurred while answering. Please try again later."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(message: &str) -> Error {
        Error::Provider {
            status: Some(400),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_classify() {
        let cases = [
            ("model_not_found: no such model", ProviderFailure::ModelNotFound),
            (
                "model_decommissioned: llama-3.1-70b-versatile has been decommissioned",
                ProviderFailure::ModelNotFound,
            ),
            ("The model `gpt-9` does not exist", ProviderFailure::ModelNotFound),
            ("authentication_error: bad key", ProviderFailure::Authentication),
            (
                "invalid_request_error: invalid_api_key: Invalid API Key",
                ProviderFailure::Authentication,
            ),
            ("tokens: rate_limit_exceeded: slow down", ProviderFailure::RateLimit),
            ("internal server error", ProviderFailure::Unexpected),
        ];

        for (message, expected) in cases {
            assert_eq!(ProviderFailure::classify(&provider(message)), expected, "{message}");
        }
    }

    #[test]
    fn test_messages_are_distinct() {
        let all = [
            ProviderFailure::ModelNotFound,
            ProviderFailure::Authentication,
            ProviderFailure::RateLimit,
            ProviderFailure::Unexpected,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.message(), b.message());
            }
        }
    }
}
