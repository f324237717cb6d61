use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};
use tracing::{debug, info};

pub mod config;
pub mod error;
pub mod gemini;

pub use config::Config;
pub use error::{Error, Result};
pub use gemini::GeminiClient;

pub const PROMPT: &str = concat!(
    "Analyze this image and determine what type of garbage/waste is shown. \n",
    "Respond with ONLY one of these types (exactly as written):\n",
    "- plastic\n",
    "- paper\n",
    "- glass\n",
    "- metal\n",
    "- organic\n",
    "- hazardous\n",
    "- other\n",
    "\n",
    "If you cannot clearly identify the type, respond with \"other\".\n",
    "Do not include any explanation, just the type.",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteType {
    Plastic,
    Paper,
    Glass,
    Metal,
    Organic,
    Hazardous,
    Other,
}

impl WasteType {
    pub const ALL: [WasteType; 7] = [
        WasteType::Plastic,
        WasteType::Paper,
        WasteType::Glass,
        WasteType::Metal,
        WasteType::Organic,
        WasteType::Hazardous,
        WasteType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WasteType::Plastic => "plastic",
            WasteType::Paper => "paper",
            WasteType::Glass => "glass",
            WasteType::Metal => "metal",
            WasteType::Organic => "organic",
            WasteType::Hazardous => "hazardous",
            WasteType::Other => "other",
        }
    }

    /// `Medium` for `Other`, `High` for everything else.
    pub fn confidence(self) -> Confidence {
        match self {
            WasteType::Other => Confidence::Medium,
            _ => Confidence::High,
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match against the lowercase label names.
impl FromStr for WasteType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        WasteType::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
}

/// Outcome of one classification, serialized as the program's only stdout line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClassificationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "type")]
    pub waste_type: WasteType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl ClassificationResult {
    pub fn success(waste_type: WasteType) -> Self {
        Self {
            error: None,
            waste_type,
            confidence: Some(waste_type.confidence()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            waste_type: WasteType::Other,
            confidence: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Trims and lower-cases a service reply; anything that is not exactly a
/// known label becomes `Other`.
pub fn normalize_label(reply: &str) -> WasteType {
    reply
        .trim()
        .to_lowercase()
        .parse()
        .unwrap_or(WasteType::Other)
}

/// A text-in/text-out multimodal model.
#[async_trait]
pub trait VisionService: Send + Sync {
    async fn submit(&self, prompt: &str, image: &[u8]) -> Result<String>;
}

async fn try_classify<S>(service: &S, image_path: &Path) -> Result<WasteType>
where
    S: VisionService + ?Sized,
{
    if !image_path.exists() {
        return Err(Error::NotFound);
    }

    let image = fs::read(image_path)?;
    debug!(path = %image_path.display(), bytes = image.len(), "read image");

    let reply = service.submit(PROMPT, &image).await?;
    let waste_type = normalize_label(&reply);
    if waste_type == WasteType::Other && !reply.trim().eq_ignore_ascii_case("other") {
        debug!(reply = %reply.trim(), "unrecognized reply mapped to other");
    }

    Ok(waste_type)
}

/// Classifies one image. Every failure is folded into the returned result and
/// also reported on stderr.
pub async fn classify<S>(service: &S, image_path: impl AsRef<Path>) -> ClassificationResult
where
    S: VisionService + ?Sized,
{
    match try_classify(service, image_path.as_ref()).await {
        Ok(waste_type) => {
            info!(%waste_type, "classified image");
            ClassificationResult::success(waste_type)
        }
        Err(e) => {
            eprintln!("Error analyzing image: {e}");
            ClassificationResult::failure(e.to_string())
        }
    }
}
