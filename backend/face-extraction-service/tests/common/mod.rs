//! In-memory collaborators for pipeline tests

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use face_extraction_service::config::{CropperConfig, MessageFormat};
use face_extraction_service::error::{ExtractionError, Result};
use face_extraction_service::models::FaceBoundingBox;
use face_extraction_service::services::{
    BatchProcessor, ExtractionOrchestrator, FaceCropper, FaceDetector, NotificationQueue,
    NotificationSender, ObjectStore,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Solid-colour PNG; `seed` keeps images (and their base64) distinct
pub fn png(width: u32, height: u32, seed: u8) -> Bytes {
    let img = RgbImage::from_pixel(width, height, Rgb([seed, 255 - seed, 64]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

pub fn bbox(left: u32, top: u32, width: u32, height: u32) -> FaceBoundingBox {
    FaceBoundingBox {
        left,
        top,
        width,
        height,
    }
}

pub fn encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<BTreeMap<(String, String), Bytes>>,
    pub gets: Mutex<Vec<String>>,
    pub puts: Mutex<Vec<String>>,
    pub fail_puts_for: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn insert(&self, bucket: &str, key: &str, data: Bytes) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data);
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .map(|(_, key)| key.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.gets.lock().unwrap().push(key.to_string());
        self.object(bucket, key)
            .ok_or_else(|| ExtractionError::Fetch(format!("Object not found: {}/{}", bucket, key)))
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes, _content_type: &str) -> Result<()> {
        if let Some(fragment) = self.fail_puts_for.lock().unwrap().as_deref() {
            if key.contains(fragment) {
                return Err(ExtractionError::StoreWrite(format!("rejected {}", key)));
            }
        }
        self.puts.lock().unwrap().push(key.to_string());
        self.insert(bucket, key, data);
        Ok(())
    }
}

/// Detector answering by image content
#[derive(Default)]
pub struct ScriptedDetector {
    pub responses: Mutex<HashMap<String, Result<Vec<FaceBoundingBox>>>>,
    pub calls: Mutex<usize>,
}

impl ScriptedDetector {
    pub fn respond(&self, image: &[u8], response: Result<Vec<FaceBoundingBox>>) {
        self.responses
            .lock()
            .unwrap()
            .insert(encode(image), response);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl FaceDetector for ScriptedDetector {
    async fn detect(&self, image_base64: &str) -> Result<Vec<FaceBoundingBox>> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .get(image_base64)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    pub bodies: Mutex<Vec<String>>,
    pub fail: Mutex<bool>,
}

impl RecordingQueue {
    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationQueue for RecordingQueue {
    async fn publish(&self, body: String) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(ExtractionError::StoreWrite("queue unavailable".to_string()));
        }
        self.bodies.lock().unwrap().push(body);
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub detector: Arc<ScriptedDetector>,
    pub queue: Arc<RecordingQueue>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            detector: Arc::new(ScriptedDetector::default()),
            queue: Arc::new(RecordingQueue::default()),
        }
    }

    pub fn orchestrator(&self) -> ExtractionOrchestrator {
        ExtractionOrchestrator::new(
            self.store.clone(),
            self.detector.clone(),
            Arc::new(FaceCropper::new(CropperConfig::default())),
        )
    }

    pub fn processor(&self) -> BatchProcessor {
        BatchProcessor::new(
            self.orchestrator(),
            NotificationSender::new(self.queue.clone(), MessageFormat::List),
        )
    }
}
