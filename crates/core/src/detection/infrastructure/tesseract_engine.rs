//! Recognition engine backed by the `tesseract` command-line tool.
//!
//! Each call writes the frame to a temporary PNG, runs Tesseract in TSV
//! mode and groups word rows into line boxes.

use std::path::PathBuf;
use std::process::Command;

use crate::detection::domain::recognition_engine::{RawTextBox, RecognitionEngine, RecognitionError};
use crate::shared::frame::Frame;

pub const DEFAULT_TESSERACT_LANGUAGE: &str = "jpn";

/// Sparse text: find as much text as possible in no particular order.
pub const DEFAULT_PAGE_SEGMENTATION_MODE: u32 = 11;

/// TSV `level` value for word rows.
const WORD_LEVEL: &str = "5";

pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
    psm: u32,
}

impl TesseractEngine {
    pub fn new(language: &str) -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: language.to_string(),
            psm: DEFAULT_PAGE_SEGMENTATION_MODE,
        }
    }

    pub fn with_binary(mut self, binary: PathBuf) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_page_segmentation_mode(mut self, psm: u32) -> Self {
        self.psm = psm;
        self
    }

    fn write_input(&self, frame: &Frame) -> Result<tempfile::NamedTempFile, RecognitionError> {
        if frame.channels() != 3 {
            return Err(RecognitionError::Prepare(format!(
                "expected RGB frame, got {} channels",
                frame.channels()
            )));
        }
        let file = tempfile::Builder::new()
            .prefix("live-translate-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| RecognitionError::Prepare(e.to_string()))?;
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or_else(|| RecognitionError::Prepare("frame buffer size mismatch".into()))?;
        img.save_with_format(file.path(), image::ImageFormat::Png)
            .map_err(|e| RecognitionError::Prepare(e.to_string()))?;
        Ok(file)
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TESSERACT_LANGUAGE)
    }
}

impl RecognitionEngine for TesseractEngine {
    fn recognize(&mut self, frame: &Frame) -> Result<Vec<RawTextBox>, RecognitionError> {
        let input = self.write_input(frame)?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .output()
            .map_err(RecognitionError::Launch)?;

        if !output.status.success() {
            return Err(RecognitionError::Engine {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let tsv = String::from_utf8(output.stdout)
            .map_err(|e| RecognitionError::Output(e.to_string()))?;
        parse_tsv_lines(&tsv)
    }
}

struct LineAccumulator {
    key: (u32, u32, u32, u32),
    text: String,
    conf_sum: f64,
    words: usize,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl LineAccumulator {
    fn push(&mut self, word: &str, conf: f64, left: f64, top: f64, width: f64, height: f64) {
        if needs_space(&self.text, word) {
            self.text.push(' ');
        }
        self.text.push_str(word);
        self.conf_sum += conf;
        self.words += 1;
        self.x1 = self.x1.min(left);
        self.y1 = self.y1.min(top);
        self.x2 = self.x2.max(left + width);
        self.y2 = self.y2.max(top + height);
    }

    fn finish(self) -> RawTextBox {
        let conf = self.conf_sum / self.words.max(1) as f64;
        RawTextBox::from_rect(
            self.x1,
            self.y1,
            self.x2 - self.x1,
            self.y2 - self.y1,
            self.text,
            (conf / 100.0).clamp(0.0, 1.0),
        )
    }
}

/// Groups Tesseract word rows into one box per `(page, block, par, line)`,
/// keeping the order in which lines first appear.
fn parse_tsv_lines(tsv: &str) -> Result<Vec<RawTextBox>, RecognitionError> {
    let mut lines: Vec<LineAccumulator> = Vec::new();

    for (row_no, row) in tsv.lines().enumerate() {
        if row_no == 0 && row.starts_with("level") {
            continue;
        }
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != WORD_LEVEL {
            continue;
        }
        let word = cols[11].trim();
        let conf: f64 = parse_col(cols[10], row_no)?;
        if word.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (
            parse_col(cols[1], row_no)?,
            parse_col(cols[2], row_no)?,
            parse_col(cols[3], row_no)?,
            parse_col(cols[4], row_no)?,
        );
        let left: f64 = parse_col(cols[6], row_no)?;
        let top: f64 = parse_col(cols[7], row_no)?;
        let width: f64 = parse_col(cols[8], row_no)?;
        let height: f64 = parse_col(cols[9], row_no)?;

        match lines.iter_mut().find(|l| l.key == key) {
            Some(line) => line.push(word, conf, left, top, width, height),
            None => {
                let mut line = LineAccumulator {
                    key,
                    text: String::new(),
                    conf_sum: 0.0,
                    words: 0,
                    x1: f64::INFINITY,
                    y1: f64::INFINITY,
                    x2: f64::NEG_INFINITY,
                    y2: f64::NEG_INFINITY,
                };
                line.push(word, conf, left, top, width, height);
                lines.push(line);
            }
        }
    }

    Ok(lines.into_iter().map(LineAccumulator::finish).collect())
}

fn parse_col<T: std::str::FromStr>(value: &str, row_no: usize) -> Result<T, RecognitionError> {
    value
        .trim()
        .parse()
        .map_err(|_| RecognitionError::Output(format!("row {row_no}: bad value {value:?}")))
}

/// Words of CJK scripts are written without separating spaces.
fn needs_space(left: &str, right: &str) -> bool {
    match (left.chars().last(), right.chars().next()) {
        (Some(a), Some(b)) => !(is_cjk(a) && is_cjk(b)),
        _ => false,
    }
}

fn is_cjk(ch: char) -> bool {
    matches!(
        ch,
        '\u{3000}'..='\u{303F}'
            | '\u{3040}'..='\u{30FF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{AC00}'..='\u{D7AF}'
            | '\u{FF00}'..='\u{FFEF}'
    )
}
