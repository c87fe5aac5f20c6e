#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chat_relay_service::config::RelayConfig;
use chat_relay_service::startup::Application;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use reqwest::multipart::{Form, Part};
use std::io::Cursor;
use std::net::{IpAddr, Ipv4Addr};
use wiremock::MockServer;

pub const VISION_MODEL: &str = "llava:latest";
pub const TEXT_MODEL: &str = "llama3:latest";

/// Nothing listens on port 1, so connections are refused straight away.
pub const UNREACHABLE_OLLAMA: &str = "http://127.0.0.1:1";

pub struct TestApp {
    pub address: String,
    pub ollama: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Relay pointed at a fresh mock Ollama server.
    pub async fn spawn() -> Self {
        let ollama = MockServer::start().await;
        let base_url = ollama.uri();
        Self::spawn_with(ollama, RelayConfig::with_base_url(base_url)).await
    }

    /// Relay against a mock Ollama server, accepting at most `max_upload_bytes` per request.
    pub async fn spawn_with_upload_limit(max_upload_bytes: usize) -> Self {
        let ollama = MockServer::start().await;
        let mut config = RelayConfig::with_base_url(ollama.uri());
        config.max_upload_bytes = max_upload_bytes;
        Self::spawn_with(ollama, config).await
    }

    /// Relay pointed at an address where no Ollama is running.
    pub async fn spawn_unreachable() -> Self {
        let ollama = MockServer::start().await;
        Self::spawn_with(ollama, RelayConfig::with_base_url(UNREACHABLE_OLLAMA)).await
    }

    async fn spawn_with(ollama: MockServer, mut config: RelayConfig) -> Self {
        config.common.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.common.port = 0; // Random port

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address,
            ollama,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_chat(&self, form: Form) -> reqwest::Response {
        self.client
            .post(self.url("/api/chat"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// JSON bodies of every request Ollama received, in order.
    pub async fn upstream_bodies(&self) -> Vec<(String, serde_json::Value)> {
        self.ollama
            .received_requests()
            .await
            .expect("Request recording is enabled")
            .into_iter()
            .map(|req| {
                let body = serde_json::from_slice(&req.body).unwrap_or(serde_json::Value::Null);
                (req.url.path().to_string(), body)
            })
            .collect()
    }

    /// The single JSON body sent to Ollama.
    pub async fn only_upstream_body(&self) -> (String, serde_json::Value) {
        let mut bodies = self.upstream_bodies().await;
        assert_eq!(bodies.len(), 1, "expected exactly one upstream call");
        bodies.remove(0)
    }
}

pub fn png_bytes(image: DynamicImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes.into_inner()
}

pub fn grayscale_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([140])))
        .write_to(&mut bytes, ImageFormat::Jpeg)
        .expect("Failed to encode test image");
    bytes.into_inner()
}

pub fn grayscale_png(width: u32, height: u32) -> Vec<u8> {
    png_bytes(DynamicImage::ImageLuma8(GrayImage::from_pixel(
        width,
        height,
        Luma([90]),
    )))
}

pub fn rgba_png(width: u32, height: u32) -> Vec<u8> {
    png_bytes(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([10, 200, 30, 128]),
    )))
}

pub fn image_part(file_name: &str, mime: &str, bytes: Vec<u8>) -> Part {
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("Valid mime type")
}

/// Decode a forwarded base64 image back into pixels.
pub fn decode_forwarded(encoded: &serde_json::Value) -> DynamicImage {
    let bytes = STANDARD
        .decode(encoded.as_str().expect("image is a string"))
        .expect("image is valid base64");
    image::load_from_memory(&bytes).expect("image decodes")
}
