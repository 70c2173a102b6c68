//! # Detection Models
//!
//! Loads the pretrained face detection nets from a directory of static
//! model files (the same directory the server exposes under `/models`).
//!
//! Each net is described by a `<net>_model-weights_manifest.json` file:
//!
//! ```json
//! [{ "weights": [{ "name": "conv0/filters", "shape": [3, 3, 3, 16], "dtype": "float32" }],
//!    "paths": ["tiny_face_detector_model-shard1"] }]
//! ```
//!
//! The shards listed under `paths` are concatenated and must hold exactly
//! the bytes the weight specs describe.

use lookmax_core::{DetectError, Detection, FaceDetector, Frame};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// The nets the scan screen needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelNet {
    TinyFaceDetector,
    FaceLandmark68,
    FaceRecognition,
}

impl ModelNet {
    /// Load order.
    pub const ALL: [ModelNet; 3] = [
        ModelNet::TinyFaceDetector,
        ModelNet::FaceLandmark68,
        ModelNet::FaceRecognition,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelNet::TinyFaceDetector => "tiny_face_detector",
            ModelNet::FaceLandmark68 => "face_landmark_68",
            ModelNet::FaceRecognition => "face_recognition",
        }
    }

    pub fn manifest_file(self) -> String {
        format!("{}_model-weights_manifest.json", self.name())
    }
}

impl std::fmt::Display for ModelNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors while loading one net.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid manifest for {net}: {source}")]
    Manifest {
        net: ModelNet,
        source: serde_json::Error,
    },

    #[error("unsupported dtype '{0}'")]
    UnsupportedDtype(String),

    #[error("{net}: expected {expected} weight bytes, found {actual}")]
    SizeMismatch {
        net: ModelNet,
        expected: usize,
        actual: usize,
    },
}

// =============================================================================
// MANIFEST
// =============================================================================

#[derive(Debug, Deserialize)]
struct ManifestGroup {
    weights: Vec<WeightSpec>,
    paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WeightSpec {
    name: String,
    shape: Vec<usize>,
    dtype: String,
    #[serde(default)]
    quantization: Option<Quantization>,
}

#[derive(Debug, Deserialize)]
struct Quantization {
    dtype: String,
}

impl WeightSpec {
    fn byte_len(&self) -> Result<usize, ModelError> {
        let dtype = self
            .quantization
            .as_ref()
            .map_or(self.dtype.as_str(), |q| q.dtype.as_str());
        let width = match dtype {
            "float32" | "int32" => 4,
            "uint16" => 2,
            "uint8" => 1,
            other => return Err(ModelError::UnsupportedDtype(other.to_string())),
        };
        Ok(self.shape.iter().product::<usize>().saturating_mul(width))
    }
}

/// A net whose weights were read and checked.
#[derive(Debug, Clone)]
pub struct LoadedNet {
    pub net: ModelNet,
    /// Tensor names in manifest order.
    pub tensors: Vec<String>,
    /// Raw weight bytes of all shards.
    pub bytes: Vec<u8>,
}

// =============================================================================
// MODEL SET
// =============================================================================

/// The nets that loaded successfully.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    nets: BTreeMap<ModelNet, LoadedNet>,
}

impl ModelSet {
    /// An empty set; every gated detector fails with `ModelNotLoaded`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every net from `dir`. A net that fails is logged and skipped;
    /// the others still load.
    pub async fn load(dir: &Path) -> Self {
        info!(dir = %dir.display(), "loading detection models");
        let mut nets = BTreeMap::new();
        for net in ModelNet::ALL {
            match load_net(dir, net).await {
                Ok(loaded) => {
                    info!(net = %net, tensors = loaded.tensors.len(), "loaded model");
                    nets.insert(net, loaded);
                }
                Err(e) => error!(net = %net, error = %e, "failed to load model"),
            }
        }
        info!(loaded = nets.len(), "model loading completed");
        Self { nets }
    }

    pub fn is_loaded(&self, net: ModelNet) -> bool {
        self.nets.contains_key(&net)
    }

    pub fn get(&self, net: ModelNet) -> Option<&LoadedNet> {
        self.nets.get(&net)
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
}

/// Load a single net from its manifest and shards.
pub async fn load_net(dir: &Path, net: ModelNet) -> Result<LoadedNet, ModelError> {
    let manifest_path = dir.join(net.manifest_file());
    let raw = read(&manifest_path).await?;
    let groups: Vec<ManifestGroup> =
        serde_json::from_slice(&raw).map_err(|source| ModelError::Manifest { net, source })?;

    let mut tensors = Vec::new();
    let mut bytes = Vec::new();
    let mut expected = 0usize;
    for group in groups {
        for spec in &group.weights {
            expected = expected.saturating_add(spec.byte_len()?);
        }
        tensors.extend(group.weights.into_iter().map(|w| w.name));
        for shard in &group.paths {
            bytes.extend(read(&dir.join(shard)).await?);
        }
    }

    if bytes.len() != expected {
        return Err(ModelError::SizeMismatch {
            net,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(LoadedNet { net, tensors, bytes })
}

async fn read(path: &Path) -> Result<Vec<u8>, ModelError> {
    tokio::fs::read(path).await.map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// GATED DETECTOR
// =============================================================================

/// Refuses to run until the tiny face detector net is loaded.
#[derive(Debug, Clone)]
pub struct ModelGatedDetector<D> {
    models: Arc<ModelSet>,
    inner: D,
}

impl<D> ModelGatedDetector<D> {
    pub fn new(models: Arc<ModelSet>, inner: D) -> Self {
        Self { models, inner }
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }
}

impl<D: FaceDetector> FaceDetector for ModelGatedDetector<D> {
    fn detect(&self, frame: &Frame) -> Result<Option<Detection>, DetectError> {
        if !self.models.is_loaded(ModelNet::TinyFaceDetector) {
            return Err(DetectError::ModelNotLoaded(
                ModelNet::TinyFaceDetector.name().to_string(),
            ));
        }
        self.inner.detect(frame)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lookmax_core::BoundingBox;
    use tempfile::TempDir;

    fn write_net(dir: &Path, net: ModelNet, shard_len: usize) {
        let shard = format!("{}_model-shard1", net.name());
        let manifest = format!(
            r#"[{{"weights":[{{"name":"conv0/filters","shape":[2,2],"dtype":"float32"}}],"paths":["{}"]}}]"#,
            shard
        );
        std::fs::write(dir.join(net.manifest_file()), manifest).unwrap();
        std::fs::write(dir.join(shard), vec![0u8; shard_len]).unwrap();
    }

    struct AlwaysFace;

    impl FaceDetector for AlwaysFace {
        fn detect(&self, _frame: &Frame) -> Result<Option<Detection>, DetectError> {
            Ok(Some(Detection::new(
                0.8,
                BoundingBox {
                    x: 1.0,
                    y: 1.0,
                    width: 10.0,
                    height: 10.0,
                },
            )))
        }
    }

    #[test]
    fn manifest_file_names() {
        assert_eq!(
            ModelNet::TinyFaceDetector.manifest_file(),
            "tiny_face_detector_model-weights_manifest.json"
        );
        assert_eq!(
            ModelNet::FaceLandmark68.manifest_file(),
            "face_landmark_68_model-weights_manifest.json"
        );
        assert_eq!(
            ModelNet::FaceRecognition.manifest_file(),
            "face_recognition_model-weights_manifest.json"
        );
    }

    #[test]
    fn quantized_weights_use_quantized_width() {
        let spec: WeightSpec = serde_json::from_str(
            r#"{"name":"w","shape":[4,4],"dtype":"float32","quantization":{"dtype":"uint8","scale":0.1,"min":0}}"#,
        )
        .unwrap();
        assert_eq!(spec.byte_len().unwrap(), 16);
    }

    #[tokio::test]
    async fn loads_all_nets() {
        let dir = TempDir::new().unwrap();
        for net in ModelNet::ALL {
            write_net(dir.path(), net, 16);
        }
        let models = ModelSet::load(dir.path()).await;
        assert_eq!(models.len(), 3);
        let tiny = models.get(ModelNet::TinyFaceDetector).unwrap();
        assert_eq!(tiny.tensors, vec!["conv0/filters".to_string()]);
        assert_eq!(tiny.bytes.len(), 16);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let dir = TempDir::new().unwrap();
        write_net(dir.path(), ModelNet::TinyFaceDetector, 16);
        write_net(dir.path(), ModelNet::FaceLandmark68, 15);

        let models = ModelSet::load(dir.path()).await;
        assert!(models.is_loaded(ModelNet::TinyFaceDetector));
        assert!(!models.is_loaded(ModelNet::FaceLandmark68));
        assert!(!models.is_loaded(ModelNet::FaceRecognition));
    }

    #[tokio::test]
    async fn short_shard_is_size_mismatch() {
        let dir = TempDir::new().unwrap();
        write_net(dir.path(), ModelNet::FaceRecognition, 8);
        let err = load_net(dir.path(), ModelNet::FaceRecognition).await.unwrap_err();
        assert!(matches!(
            err,
            ModelError::SizeMismatch {
                expected: 16,
                actual: 8,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn bad_manifest_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(ModelNet::TinyFaceDetector.manifest_file()),
            "{}",
        )
        .unwrap();
        let err = load_net(dir.path(), ModelNet::TinyFaceDetector).await.unwrap_err();
        assert!(matches!(err, ModelError::Manifest { .. }));
    }

    #[test]
    fn gated_detector_requires_tiny_face_detector() {
        let detector = ModelGatedDetector::new(Arc::new(ModelSet::empty()), AlwaysFace);
        let frame = Frame::new("image/jpeg", vec![1, 2, 3]);
        assert_eq!(
            detector.detect(&frame),
            Err(DetectError::ModelNotLoaded("tiny_face_detector".into()))
        );
    }

    #[tokio::test]
    async fn gated_detector_delegates_once_loaded() {
        let dir = TempDir::new().unwrap();
        write_net(dir.path(), ModelNet::TinyFaceDetector, 16);
        let models = Arc::new(ModelSet::load(dir.path()).await);
        let detector = ModelGatedDetector::new(models, AlwaysFace);
        let frame = Frame::new("image/jpeg", vec![1, 2, 3]);
        assert!(detector.detect(&frame).unwrap().is_some());
    }
}
