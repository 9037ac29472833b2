use anyhow::Result;

/// Reads text from a raster drawing (PNG, JPEG, TIFF, ...).
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Tesseract through its C API. Only available with the `ocr` feature.
#[cfg(feature = "ocr")]
pub struct TesseractOcr {
    tessdata_dir: Option<std::path::PathBuf>,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    /// `tessdata_dir` of `None` lets Tesseract use `TESSDATA_PREFIX` or its build default.
    pub fn new(tessdata_dir: Option<&std::path::Path>) -> Result<Self> {
        if let Some(dir) = tessdata_dir {
            if !dir.join("eng.traineddata").exists() {
                anyhow::bail!("eng.traineddata not found in {}", dir.display());
            }
        }
        Ok(Self {
            tessdata_dir: tessdata_dir.map(|d| d.to_path_buf()),
        })
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String> {
        use anyhow::{anyhow, Context};

        let datapath = match &self.tessdata_dir {
            Some(dir) => Some(dir.to_str().context("tessdata path is not UTF-8")?),
            None => None,
        };
        let tess = tesseract::Tesseract::new(datapath, Some("eng"))
            .map_err(|e| anyhow!("init Tesseract: {e:?}"))?;
        // Digits and the few symbols drawings use around them.
        let tess = tess
            .set_variable("tessedit_char_whitelist", "0123456789.,+-xX×ØR ")
            .map_err(|e| anyhow!("configure Tesseract: {e:?}"))?;
        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| anyhow!("load image: {e:?}"))?;
        tess.get_text().map_err(|e| anyhow!("recognize: {e:?}"))
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

/// Fixed-output engine for tests and dry runs.
pub struct MockOcrEngine {
    pub text: String,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String> {
        Ok(self.text.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
