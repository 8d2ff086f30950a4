//! Inference Engine - ONNX Runtime Integration
//!
//! Loads the exported fatigue classifier and runs single-row inference.
//! The session is loaded once at startup and never modified afterwards.

use std::path::{Path, PathBuf};
use std::time::Instant;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::layout::{layout_hash, FEATURE_COUNT, FEATURE_VERSION};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("failed to load model: {0}")]
    Load(String),

    #[error("feature shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("inference failed: {0}")]
    Runtime(String),

    #[error("classifier returned label {0}, expected 0 or 1")]
    InvalidLabel(i64),
}

// ============================================================================
// INFERENCE ENGINE TRAIT
// ============================================================================

/// Binary classifier boundary: one feature row in, one integer label out
pub trait FatigueModel: Send {
    /// Number of input columns the model was trained on
    fn input_width(&self) -> usize;

    fn predict(&self, features: &[f32]) -> Result<i64, InferenceError>;
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub input_name: String,
    pub output_name: String,
    pub features: usize,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// Fatigue classifier exported to ONNX (e.g. via skl2onnx)
pub struct OnnxFatigueModel {
    session: Mutex<Session>,
    metadata: ModelMetadata,
}

impl OnnxFatigueModel {
    /// Load ONNX model from file
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        log::info!("Loading fatigue model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(InferenceError::ModelNotFound(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::Load(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Load(format!("optimization level: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError::Load(e.to_string()))?;

        let input_name = session.inputs.first()
            .map(|i| i.name.clone())
            .ok_or_else(|| InferenceError::Load("model declares no inputs".to_string()))?;

        // skl2onnx classifiers expose `output_label` next to `output_probability`
        let output_name = session.outputs.iter()
            .find(|o| o.name.contains("label"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::Load("model declares no outputs".to_string()))?;

        let metadata = ModelMetadata {
            model_path: model_path.display().to_string(),
            input_name,
            output_name,
            features: FEATURE_COUNT,
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            loaded_at: chrono::Utc::now(),
        };

        log::info!(
            "Fatigue model loaded (input: {}, output: {}, layout v{} {:08x})",
            metadata.input_name,
            metadata.output_name,
            metadata.feature_version,
            metadata.layout_hash
        );

        Ok(Self {
            session: Mutex::new(session),
            metadata,
        })
    }
}

impl FatigueModel for OnnxFatigueModel {
    fn input_width(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict(&self, features: &[f32]) -> Result<i64, InferenceError> {
        let start_time = Instant::now();

        let input_array = Array2::<f32>::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| InferenceError::Runtime(format!("array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError::Runtime(format!("tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let output = outputs.get(&self.metadata.output_name)
            .ok_or_else(|| InferenceError::Runtime("no label output".to_string()))?;

        // Labels are int64 for sklearn exports; some converters emit float
        let label = match output.try_extract_tensor::<i64>() {
            Ok((_, data)) => data.first().copied(),
            Err(_) => output.try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::Runtime(format!("extract error: {}", e)))?
                .1
                .first()
                .map(|v| v.round() as i64),
        }
        .ok_or_else(|| InferenceError::Runtime("empty label tensor".to_string()))?;

        log::trace!("Fatigue inference took {}us", start_time.elapsed().as_micros());
        Ok(label)
    }
}
