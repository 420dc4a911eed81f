//! Capture options derived from the masking level.

use scry_core::MaskingLevel;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Elements carrying this class are left out of the capture entirely.
pub const BLOCK_CLASS: &str = "scry-block";

/// Text transformation applied by the capture routine before recording.
#[derive(Clone)]
pub struct TextMask(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl TextMask {
    pub fn new(mask: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(mask))
    }

    /// Replaces every character except line terminators with `*`.
    pub fn asterisks() -> Self {
        Self::new(|text| {
            text.chars()
                .map(|c| match c {
                    '\n' | '\r' | '\u{2028}' | '\u{2029}' => c,
                    _ => '*',
                })
                .collect()
        })
    }

    pub fn apply(&self, text: &str) -> String {
        (self.0)(text)
    }
}

impl fmt::Debug for TextMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TextMask(..)")
    }
}

/// Input kinds whose values are masked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaskInputOptions {
    pub password: bool,
    pub email: bool,
    pub textarea: bool,
}

#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub block_class: String,
    /// Elements whose text nodes are masked.
    pub mask_text_selector: Option<String>,
    pub mask_text_fn: Option<TextMask>,
    pub mask_all_inputs: bool,
    pub mask_input_fn: Option<TextMask>,
    pub mask_input_options: Option<MaskInputOptions>,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            block_class: BLOCK_CLASS.to_string(),
            mask_text_selector: None,
            mask_text_fn: None,
            mask_all_inputs: false,
            mask_input_fn: None,
            mask_input_options: None,
        }
    }
}

impl RecordOptions {
    pub fn for_masking_level(level: MaskingLevel) -> Self {
        match level {
            MaskingLevel::None => Self::default(),
            MaskingLevel::All | MaskingLevel::Unrecognized => {
                let mask = TextMask::asterisks();
                Self {
                    mask_text_selector: Some("*".to_string()),
                    mask_text_fn: Some(mask.clone()),
                    mask_all_inputs: true,
                    mask_input_fn: Some(mask),
                    ..Self::default()
                }
            }
            MaskingLevel::InputAndTextarea => Self {
                mask_all_inputs: true,
                ..Self::default()
            },
            MaskingLevel::InputPasswordOrEmailAndTextarea => Self {
                mask_input_options: Some(MaskInputOptions {
                    password: true,
                    email: true,
                    textarea: true,
                }),
                ..Self::default()
            },
        }
    }

    /// Whether anything at all is masked.
    pub fn masks_anything(&self) -> bool {
        self.mask_text_fn.is_some() || self.mask_all_inputs || self.mask_input_options.is_some()
    }
}
