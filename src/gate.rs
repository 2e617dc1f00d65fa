use crate::{
    auth::TokenDecoder,
    classifier::PathClassifier,
    config::GateConfig,
    models::{Decision, RouteCategory},
    policy,
};

/// Gate
///
/// The per-request pipeline: decode the token, classify the path, consult the policy
/// table. Built once at start-up and shared read-only between all requests.
#[derive(Clone)]
pub struct Gate {
    decoder: TokenDecoder,
    classifier: PathClassifier,
}

/// What the gate concluded about one request, kept together for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub category: RouteCategory,
    pub authenticated: bool,
    pub decision: Decision,
}

impl Gate {
    pub fn new(decoder: TokenDecoder, classifier: PathClassifier) -> Self {
        Self {
            decoder,
            classifier,
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(
            TokenDecoder::from_config(config),
            PathClassifier::from_config(config),
        )
    }

    pub fn decoder(&self) -> &TokenDecoder {
        &self.decoder
    }

    pub fn classifier(&self) -> &PathClassifier {
        &self.classifier
    }

    pub fn evaluate(&self, raw_token: Option<&str>, path: &str, now: i64) -> Decision {
        self.inspect(raw_token, path, now).decision
    }

    /// Same as `evaluate`, also reporting the intermediate results.
    pub fn inspect(&self, raw_token: Option<&str>, path: &str, now: i64) -> Evaluation {
        let claims = self.decoder.decode(raw_token, now);
        let category = self.classifier.classify(path);
        let decision = policy::evaluate(category, claims.as_ref(), now);

        Evaluation {
            category,
            authenticated: claims.is_some(),
            decision,
        }
    }
}
