// src/classifier.rs - Gesture label prediction seam plus a template-matching implementation
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use nalgebra::DVector;
use tracing::{debug, info};

use crate::error::ClassifierError;
use crate::features::{FeatureVector, FEATURE_LEN};

/// Anything that turns a hand feature vector into a chord label such as `"Am"`.
///
/// The model may live out of process, so prediction is asynchronous. Callers
/// treat an error as "no new gesture this frame".
pub trait GestureClassifier {
    fn classify(
        &self,
        features: &FeatureVector,
    ) -> impl Future<Output = Result<String, ClassifierError>> + Send;
}

/// Run one prediction, giving up after `limit`.
pub async fn classify_with_timeout<C: GestureClassifier>(
    classifier: &C,
    features: &FeatureVector,
    limit: Duration,
) -> Result<String, ClassifierError> {
    match tokio::time::timeout(limit, classifier.classify(features)).await {
        Ok(result) => result,
        Err(_) => Err(ClassifierError::Timeout(limit)),
    }
}

/// Nearest-neighbour over recorded feature vectors, one or more per label.
#[derive(Debug, Clone, Default)]
pub struct TemplateClassifier {
    templates: Vec<(String, DVector<f64>)>,
}

impl TemplateClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_template(&mut self, label: impl Into<String>, features: &[f64]) -> Result<(), ClassifierError> {
        if features.len() != FEATURE_LEN {
            return Err(ClassifierError::FeatureLength {
                expected: FEATURE_LEN,
                got: features.len(),
            });
        }
        self.templates
            .push((label.into(), DVector::from_column_slice(features)));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Load `{"C": [[27 floats], ...], "Am": [...]}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read templates {}", path.display()))?;
        let raw: BTreeMap<String, Vec<Vec<f64>>> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse templates {}", path.display()))?;

        let mut classifier = Self::new();
        for (label, samples) in raw {
            for sample in samples {
                classifier
                    .add_template(label.clone(), &sample)
                    .with_context(|| format!("Bad template for {}", label))?;
            }
        }
        info!("Loaded {} gesture templates from {}", classifier.len(), path.display());
        Ok(classifier)
    }

    pub fn predict(&self, features: &[f64]) -> Result<String, ClassifierError> {
        if features.len() != FEATURE_LEN {
            return Err(ClassifierError::FeatureLength {
                expected: FEATURE_LEN,
                got: features.len(),
            });
        }
        let query = DVector::from_column_slice(features);

        let (label, dist) = self
            .templates
            .iter()
            .map(|(label, template)| (label, (template - &query).norm()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(ClassifierError::Empty)?;

        debug!("Template match {} (distance {:.3})", label, dist);
        Ok(label.clone())
    }
}

impl GestureClassifier for TemplateClassifier {
    async fn classify(&self, features: &FeatureVector) -> Result<String, ClassifierError> {
        self.predict(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    impl GestureClassifier for Stalled {
        async fn classify(&self, _features: &FeatureVector) -> Result<String, ClassifierError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("C".to_string())
        }
    }

    fn vector(fill: f64) -> Vec<f64> {
        vec![fill; FEATURE_LEN]
    }

    #[test]
    fn picks_nearest_template() {
        let mut classifier = TemplateClassifier::new();
        classifier.add_template("C", &vector(1.0)).unwrap();
        classifier.add_template("Am", &vector(5.0)).unwrap();

        assert_eq!(classifier.predict(&vector(1.5)).unwrap(), "C");
        assert_eq!(classifier.predict(&vector(4.0)).unwrap(), "Am");
    }

    #[test]
    fn rejects_bad_input() {
        let mut classifier = TemplateClassifier::new();
        assert!(matches!(classifier.predict(&vector(0.0)), Err(ClassifierError::Empty)));
        assert!(matches!(
            classifier.add_template("C", &[1.0, 2.0]),
            Err(ClassifierError::FeatureLength { got: 2, .. })
        ));
        classifier.add_template("C", &vector(1.0)).unwrap();
        assert!(classifier.predict(&[0.0; 3]).is_err());
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let result = classify_with_timeout(&Stalled, &vector(0.0), Duration::from_millis(10)).await;
        assert!(matches!(result, Err(ClassifierError::Timeout(_))));
    }

    #[tokio::test]
    async fn template_classifier_is_async_capable() {
        let mut classifier = TemplateClassifier::new();
        classifier.add_template("G", &vector(2.0)).unwrap();
        let label = classify_with_timeout(&classifier, &vector(2.0), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(label, "G");
    }

    #[test]
    fn loads_templates_from_json() {
        let dir = std::env::temp_dir().join(format!("air_guitar_templates_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("templates.json");
        let json = serde_json::json!({ "D": [vector(3.0)], "Em": [vector(7.0), vector(8.0)] });
        std::fs::write(&path, json.to_string()).unwrap();

        let classifier = TemplateClassifier::from_json_file(&path).unwrap();
        assert_eq!(classifier.len(), 3);
        assert_eq!(classifier.predict(&vector(7.9)).unwrap(), "Em");

        std::fs::remove_dir_all(&dir).ok();
    }
}
