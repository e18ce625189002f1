use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{info, warn};

use common::{ClassificationResult, Error, PredictedClass, Result};

/// Raw model output for one input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// 0 = HOLD, 1 = BUY, 2 = SELL.
    pub class_index: usize,
    /// One probability per class.
    pub probabilities: Vec<f64>,
}

/// A classification capability: one row of features in, one prediction out.
///
/// `LinearModel` is the trained model, `FallbackClassifier` a seeded random
/// stand-in with the same contract.
pub trait Classifier: Send {
    /// Predict for a `(1, n)` feature matrix.
    fn predict(&mut self, features: &Array2<f64>) -> Result<Prediction>;

    /// Column names the classifier was trained on, in order, if it knows them.
    fn expected_features(&self) -> Option<&[String]> {
        None
    }

    /// Predict and reduce to class + confidence (the maximum probability).
    fn score(&mut self, features: &Array2<f64>) -> Result<ClassificationResult> {
        if features.nrows() != 1 {
            return Err(Error::Model(format!(
                "expected a single row, got shape {:?}",
                features.shape()
            )));
        }
        let prediction = self.predict(features)?;
        let confidence = prediction
            .probabilities
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .fold(0.0, f64::max)
            .clamp(0.0, 1.0);
        Ok(ClassificationResult {
            class: PredictedClass::from_index(prediction.class_index),
            confidence,
        })
    }
}

/// Multinomial logistic model: `softmax(W · x + b)` over HOLD/BUY/SELL.
///
/// Loaded from JSON:
/// ```json
/// { "weights": [[...], [...], [...]], "bias": [0.0, 0.0, 0.0] }
/// ```
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Array2<f64>,
    bias: Array1<f64>,
    feature_names: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ModelFile {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
}

impl LinearModel {
    pub const CLASSES: usize = 3;

    pub fn new(weights: Array2<f64>, bias: Array1<f64>) -> Result<Self> {
        if weights.nrows() != Self::CLASSES || bias.len() != Self::CLASSES {
            return Err(Error::Model(format!(
                "model must have {} classes, got weights {:?} and {} biases",
                Self::CLASSES,
                weights.shape(),
                bias.len()
            )));
        }
        if weights.iter().chain(bias.iter()).any(|w| !w.is_finite()) {
            return Err(Error::Model("model parameters must be finite".into()));
        }
        Ok(Self {
            weights,
            bias,
            feature_names: None,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json)?;
        let width = file.weights.first().map(Vec::len).unwrap_or(0);
        if width == 0 || file.weights.iter().any(|row| row.len() != width) {
            return Err(Error::Model("weight rows must be non-empty and equal length".into()));
        }
        let flat: Vec<f64> = file.weights.into_iter().flatten().collect();
        let rows = flat.len() / width;
        let weights = Array2::from_shape_vec((rows, width), flat)
            .map_err(|e| Error::Model(e.to_string()))?;
        let mut model = Self::new(weights, Array1::from(file.bias))?;
        if let Some(names) = &file.feature_names {
            if names.len() != width {
                return Err(Error::Model(format!(
                    "{} feature names for {width} weights",
                    names.len()
                )));
            }
        }
        model.feature_names = file.feature_names;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Number of input features the model expects.
    pub fn width(&self) -> usize {
        self.weights.ncols()
    }

}

impl Classifier for LinearModel {
    fn expected_features(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&mut self, features: &Array2<f64>) -> Result<Prediction> {
        if features.ncols() != self.width() {
            return Err(Error::Model(format!(
                "model expects {} features, got {}",
                self.width(),
                features.ncols()
            )));
        }
        let row = features.index_axis(Axis(0), 0);
        let logits = self.weights.dot(&row) + &self.bias;

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        let probabilities: Vec<f64> = exp.iter().map(|e| e / total).collect();

        let class_index = argmax(&probabilities);
        Ok(Prediction {
            class_index,
            probabilities,
        })
    }
}

/// Random stand-in used when no trained model is available.
///
/// Deterministic for a given seed, which makes the gating logic testable
/// end-to-end without a real model.
#[derive(Debug)]
pub struct FallbackClassifier {
    rng: StdRng,
}

impl FallbackClassifier {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Classifier for FallbackClassifier {
    fn predict(&mut self, _features: &Array2<f64>) -> Result<Prediction> {
        let class_index = self.rng.gen_range(0..LinearModel::CLASSES);
        let raw: Vec<f64> = (0..LinearModel::CLASSES)
            .map(|_| self.rng.gen_range(f64::EPSILON..1.0))
            .collect();
        let total: f64 = raw.iter().sum();
        Ok(Prediction {
            class_index,
            probabilities: raw.iter().map(|p| p / total).collect(),
        })
    }
}

/// Acquire the classification capability at startup.
///
/// A model file that exists but cannot be loaded is fatal. A missing file
/// falls back to the seeded random classifier.
pub fn load_classifier(path: &Path, seed: Option<u64>) -> Result<Box<dyn Classifier>> {
    if path.exists() {
        let model = LinearModel::load(path)?;
        info!(path = %path.display(), features = model.width(), "Classification model loaded");
        return Ok(Box::new(model));
    }

    warn!(path = %path.display(), "Model file not found, using fallback classifier");
    Ok(Box::new(match seed {
        Some(seed) => FallbackClassifier::seeded(seed),
        None => FallbackClassifier::from_entropy(),
    }))
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_v), (i, &v)| {
            if v > best_v {
                (i, v)
            } else {
                (best, best_v)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;

    #[test]
    fn linear_model_picks_dominant_class() {
        let mut model = LinearModel::new(
            array![[0.0, 0.0], [5.0, 0.0], [0.0, 5.0]],
            array![0.0, 0.0, 0.0],
        )
        .unwrap();
        let result = model.score(&array![[1.0, 0.0]]).unwrap();
        assert_eq!(result.class, PredictedClass::Buy);
        assert!(result.confidence > 0.9 && result.confidence <= 1.0);

        let result = model.score(&array![[0.0, 1.0]]).unwrap();
        assert_eq!(result.class, PredictedClass::Sell);
    }

    #[test]
    fn linear_model_probabilities_sum_to_one() {
        let mut model = LinearModel::new(
            array![[0.1, -0.2], [0.3, 0.4], [-0.5, 0.6]],
            array![0.1, 0.0, -0.1],
        )
        .unwrap();
        let p = model.predict(&array![[1.5, -2.0]]).unwrap();
        assert!((p.probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_model_rejects_width_mismatch() {
        let mut model =
            LinearModel::new(Array2::zeros((3, 4)), Array1::zeros(3)).unwrap();
        let err = model.score(&Array2::zeros((1, 5))).unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }

    #[test]
    fn score_requires_single_row() {
        let mut model = FallbackClassifier::seeded(1);
        assert!(model.score(&Array2::zeros((2, 5))).is_err());
    }

    #[test]
    fn parses_model_json() {
        let model = LinearModel::from_json(
            r#"{"weights": [[1, 2], [3, 4], [5, 6]], "bias": [0, 0, 0], "feature_names": ["a", "b"]}"#,
        )
        .unwrap();
        assert_eq!(model.width(), 2);
        assert_eq!(model.expected_features().unwrap(), ["a", "b"]);
        assert!(FallbackClassifier::seeded(1).expected_features().is_none());
    }

    #[test]
    fn rejects_wrong_class_count() {
        let err = LinearModel::from_json(r#"{"weights": [[1], [2]], "bias": [0, 0]}"#).unwrap_err();
        assert!(matches!(err, Error::Model(_)));
        let err = LinearModel::from_json(r#"{"weights": [[1, 2], [3], [4, 5]], "bias": [0, 0, 0]}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }

    #[test]
    fn fallback_is_deterministic_per_seed() {
        let x = Array2::zeros((1, 27));
        let mut a = FallbackClassifier::seeded(7);
        let mut b = FallbackClassifier::seeded(7);
        for _ in 0..20 {
            let ra = a.score(&x).unwrap();
            let rb = b.score(&x).unwrap();
            assert_eq!(ra, rb);
            assert!((0.0..=1.0).contains(&ra.confidence));
        }
    }

    #[test]
    fn load_falls_back_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut classifier = load_classifier(&dir.path().join("none.json"), Some(3)).unwrap();
        assert!(classifier.score(&Array2::zeros((1, 5))).is_ok());
    }

    #[test]
    fn load_fails_on_corrupt_model() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(load_classifier(file.path(), None).is_err());
    }

    #[test]
    fn load_reads_model_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"weights": [[0, 0], [1, 0], [0, 1]], "bias": [0, 0, 0]}}"#).unwrap();
        let mut classifier = load_classifier(file.path(), None).unwrap();
        let result = classifier.score(&ndarray::array![[10.0, 0.0]]).unwrap();
        assert_eq!(result.class, PredictedClass::Buy);
    }
}
