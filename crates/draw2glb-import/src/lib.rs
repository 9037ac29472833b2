use anyhow::{bail, Context, Result};
use draw2glb_core::infer::{fallback, infer_from_tokens, InferConfig};
use draw2glb_core::model::ParseResponse;
use draw2glb_core::report::Warning;
use draw2glb_core::tokens::{plausible_mm, scan_numbers};
use std::path::Path;
use std::sync::Arc;

pub mod dxf;
pub mod ocr;
pub mod pdf;
pub mod svg;

pub use ocr::{MockOcrEngine, OcrEngine};
#[cfg(feature = "ocr")]
pub use ocr::TesseractOcr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingFormat {
    Pdf,
    Image,
    Svg,
    Dxf,
    Unknown,
}

impl DrawingFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" | "webp" => Self::Image,
            "svg" => Self::Svg,
            "dxf" => Self::Dxf,
            _ => Self::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|s| s.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Svg => "svg",
            Self::Dxf => "dxf",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    VectorText,
    Ocr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub method: ExtractionMethod,
    pub text: String,
    /// Values read directly from dimension entities rather than from text.
    pub measurements: Vec<f64>,
}

/// Turns stored drawing bytes into a [`ParseResponse`].
pub struct DrawingParser {
    cfg: InferConfig,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl DrawingParser {
    pub fn new(cfg: InferConfig) -> Self {
        Self { cfg, ocr: None }
    }

    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    pub fn ocr_engine(&self) -> Option<&'static str> {
        self.ocr.as_ref().map(|e| e.name())
    }

    pub fn extract(&self, format: DrawingFormat, bytes: &[u8]) -> Result<Extracted> {
        let vector = |text: String| Extracted {
            method: ExtractionMethod::VectorText,
            text,
            measurements: Vec::new(),
        };
        match format {
            DrawingFormat::Pdf => Ok(vector(pdf::first_page_text(bytes)?)),
            DrawingFormat::Svg => Ok(vector(svg::svg_text(bytes)?)),
            DrawingFormat::Dxf => {
                let ann = crate::dxf::dxf_annotations(bytes)?;
                Ok(Extracted {
                    method: ExtractionMethod::VectorText,
                    text: ann.text,
                    measurements: ann.measurements,
                })
            }
            DrawingFormat::Image => {
                let Some(engine) = &self.ocr else {
                    bail!("no OCR engine configured");
                };
                let text = engine
                    .recognize(bytes)
                    .with_context(|| format!("OCR with {}", engine.name()))?;
                Ok(Extracted {
                    method: ExtractionMethod::Ocr,
                    text,
                    measurements: Vec::new(),
                })
            }
            DrawingFormat::Unknown => bail!("unsupported drawing format"),
        }
    }

    /// Never fails: anything that goes wrong yields the default answer
    /// with a warning explaining why.
    pub fn parse(&self, format: DrawingFormat, bytes: &[u8]) -> ParseResponse {
        match format {
            DrawingFormat::Unknown => {
                return self.fallback("unsupported_format", "file type is not a supported drawing");
            }
            DrawingFormat::Image if self.ocr.is_none() => {
                return self.fallback("ocr_unavailable", "raster drawing and no OCR engine configured");
            }
            _ => {}
        }

        let extracted = match self.extract(format, bytes) {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(format = format.as_str(), error = %format!("{err:#}"), "extraction failed");
                return self.fallback("extract_failed", format!("{err:#}"));
            }
        };

        let mut tokens = scan_numbers(&extracted.text);
        tokens.extend_from_slice(&extracted.measurements);

        match infer_from_tokens(&tokens, &self.cfg) {
            Some(resp) => {
                tracing::info!(
                    format = format.as_str(),
                    method = ?extracted.method,
                    tokens = tokens.len(),
                    confidence = resp.confidence,
                    "dimensions inferred"
                );
                resp
            }
            None => {
                let plausible = plausible_mm(&tokens, self.cfg.range).len();
                self.fallback(
                    "too_few_numbers",
                    format!(
                        "found {plausible} plausible numbers, need at least {}",
                        self.cfg.min_tokens
                    ),
                )
            }
        }
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParseResponse> {
        let bytes = std::fs::read(path).with_context(|| format!("read drawing: {path:?}"))?;
        Ok(self.parse(DrawingFormat::from_path(path), &bytes))
    }

    pub fn fallback(&self, code: &str, message: impl Into<String>) -> ParseResponse {
        fallback(&self.cfg, Warning::new(code, message))
    }
}

impl Default for DrawingParser {
    fn default() -> Self {
        Self::new(InferConfig::default())
    }
}
