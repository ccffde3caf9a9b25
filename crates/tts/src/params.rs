//! Parameter normalization: raw query values in, engine-ready request out

use thiserror::Error;
use vocalis_config::TtsConfig;

/// Marks that already give the engine a terminal pause
const SENTENCE_FINAL: [char; 4] = ['.', '।', '!', '?'];

/// Mark appended when the text ends without one (danda, read as a full stop
/// by the multilingual voices)
const APPENDED_MARK: char = '।';

/// Why a request was rejected before reaching the engine
///
/// Checks run in declaration order and the first failure wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Empty text")]
    EmptyText,
    #[error("Text too long")]
    TextTooLong,
    #[error("Voice not allowed")]
    VoiceNotAllowed,
    #[error("Invalid rate format")]
    InvalidRate,
    #[error("Invalid pitch format")]
    InvalidPitch,
}

/// A validated synthesis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    text: String,
    voice: String,
    rate: String,
    pitch: String,
}

impl SynthesisRequest {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Signed percentage, e.g. `+10%`
    pub fn rate(&self) -> &str {
        &self.rate
    }

    /// Signed frequency offset, e.g. `-5Hz`
    pub fn pitch(&self) -> &str {
        &self.pitch
    }
}

/// The static rules a deployment applies to every request
#[derive(Debug, Clone)]
pub struct VoicePolicy {
    allowed_voices: Vec<String>,
    default_voice: String,
    max_text_length: usize,
    terminal_pause: bool,
}

impl VoicePolicy {
    pub fn from_config(config: &TtsConfig) -> Self {
        Self {
            allowed_voices: config.allowed_voices.clone(),
            default_voice: config.default_voice.clone(),
            max_text_length: config.max_text_length,
            terminal_pause: config.terminal_pause,
        }
    }

    pub fn voices(&self) -> &[String] {
        &self.allowed_voices
    }

    pub fn default_voice(&self) -> &str {
        &self.default_voice
    }

    pub fn is_allowed(&self, voice: &str) -> bool {
        self.allowed_voices.iter().any(|v| v == voice)
    }

    /// Canonicalize and validate raw parameters
    ///
    /// The length limit is measured in characters on the cleaned text,
    /// before the terminal pause is appended.
    pub fn normalize(
        &self,
        raw_text: &str,
        raw_voice: &str,
        raw_rate: &str,
        raw_pitch: &str,
    ) -> Result<SynthesisRequest, ValidationError> {
        let text = clean_text(raw_text);

        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }

        if text.chars().count() > self.max_text_length {
            return Err(ValidationError::TextTooLong);
        }

        if !self.is_allowed(raw_voice) {
            return Err(ValidationError::VoiceNotAllowed);
        }

        let rate = with_sign(raw_rate);
        if !is_signed_quantity(&rate, "%") {
            return Err(ValidationError::InvalidRate);
        }

        let pitch = with_sign(raw_pitch);
        if !is_signed_quantity(&pitch, "Hz") {
            return Err(ValidationError::InvalidPitch);
        }

        let text = if self.terminal_pause {
            with_terminal_pause(text)
        } else {
            text
        };

        Ok(SynthesisRequest {
            text,
            voice: raw_voice.to_string(),
            rate,
            pitch,
        })
    }
}

/// Percent-decode, trim and fold line breaks into single spaces
///
/// The query string has already been form-decoded once, turning `+` into a
/// space. This pass only undoes clients that encode twice, so any `+` still
/// present is a literal plus.
fn clean_text(raw: &str) -> String {
    let bytes = urlencoding::decode_binary(raw.as_bytes());
    let decoded = String::from_utf8_lossy(&bytes);

    decoded.trim().replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Engines drop the final word when the text has no terminal pause
fn with_terminal_pause(mut text: String) -> String {
    if !text.ends_with(SENTENCE_FINAL) {
        text.push(APPENDED_MARK);
    }
    text.push(' ');
    text
}

fn with_sign(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.starts_with(['+', '-']) {
        compact
    } else {
        format!("+{compact}")
    }
}

fn is_signed_quantity(value: &str, unit: &str) -> bool {
    value
        .strip_prefix(['+', '-'])
        .and_then(|rest| rest.strip_suffix(unit))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> VoicePolicy {
        VoicePolicy::from_config(&TtsConfig {
            default_voice: "en-US-AriaNeural".to_string(),
            allowed_voices: vec!["en-US-AriaNeural".to_string(), "hi-IN-SwaraNeural".to_string()],
            max_text_length: 10,
            ..TtsConfig::default()
        })
    }

    fn plain_policy() -> VoicePolicy {
        VoicePolicy {
            terminal_pause: false,
            ..policy()
        }
    }

    #[test]
    fn unsigned_rate_and_pitch_get_a_plus() {
        let request = policy().normalize("hello", "en-US-AriaNeural", "10%", "5Hz").unwrap();

        assert_eq!(request.rate(), "+10%");
        assert_eq!(request.pitch(), "+5Hz");
        assert_eq!(request.voice(), "en-US-AriaNeural");
    }

    #[test]
    fn whitespace_is_removed_from_rate_and_pitch() {
        let request = policy().normalize("hello", "en-US-AriaNeural", " - 20 % ", "+ 3 Hz").unwrap();

        assert_eq!(request.rate(), "-20%");
        assert_eq!(request.pitch(), "+3Hz");
    }

    #[test]
    fn terminal_pause_is_appended() {
        let request = policy().normalize("hello", "en-US-AriaNeural", "+0%", "+0Hz").unwrap();
        assert_eq!(request.text(), "hello। ");
    }

    #[test]
    fn existing_terminal_mark_only_gets_a_space() {
        for text in ["hello.", "नमस्ते।", "hi!", "why?"] {
            let request = policy().normalize(text, "en-US-AriaNeural", "+0%", "+0Hz").unwrap();
            assert_eq!(request.text(), format!("{text} "));
        }
    }

    #[test]
    fn terminal_pause_can_be_disabled() {
        let request = plain_policy().normalize("hello", "en-US-AriaNeural", "+0%", "+0Hz").unwrap();
        assert_eq!(request.text(), "hello");
    }

    #[test]
    fn line_breaks_become_spaces() {
        let request = plain_policy()
            .normalize("\n a\r\nb\nc\r ", "en-US-AriaNeural", "+0%", "+0Hz")
            .unwrap();
        assert_eq!(request.text(), "a b c");
    }

    #[test]
    fn percent_encoded_text_is_decoded_and_plus_kept() {
        let request = plain_policy()
            .normalize("a%20b+c", "en-US-AriaNeural", "+0%", "+0Hz")
            .unwrap();
        assert_eq!(request.text(), "a b+c");
    }

    #[test]
    fn form_decoded_query_reaches_the_engine_with_spaces() {
        let query = crate::types::TtsQuery::parse(Some(
            "text=Hello+World&voice=en-US-AriaNeural&rate=%2B0%25&pitch=%2B0Hz",
        ));

        let request = policy()
            .normalize(
                query.text.as_deref().unwrap_or_default(),
                query.voice.as_deref().unwrap_or_default(),
                query.rate.as_deref().unwrap_or_default(),
                query.pitch.as_deref().unwrap_or_default(),
            )
            .unwrap();

        assert_eq!(request.text(), "Hello World। ");
        assert_eq!(request.rate(), "+0%");
        assert_eq!(request.pitch(), "+0Hz");
    }

    #[test]
    fn blank_text_is_empty() {
        for text in ["", "   ", "\n\n", "%20"] {
            assert_eq!(
                policy().normalize(text, "en-US-AriaNeural", "+0%", "+0Hz"),
                Err(ValidationError::EmptyText),
                "text {text:?}"
            );
        }
    }

    #[test]
    fn length_is_counted_in_characters() {
        // Ten Devanagari characters, far more than ten bytes
        let text = "नमस्तेनमस्";
        assert_eq!(text.chars().count(), 10);
        assert!(policy().normalize(text, "en-US-AriaNeural", "+0%", "+0Hz").is_ok());

        assert_eq!(
            policy().normalize("abcdefghijk", "en-US-AriaNeural", "+0%", "+0Hz"),
            Err(ValidationError::TextTooLong)
        );
    }

    #[test]
    fn appended_pause_does_not_count_toward_the_limit() {
        let request = policy().normalize("abcdefghij", "en-US-AriaNeural", "+0%", "+0Hz").unwrap();
        assert_eq!(request.text(), "abcdefghij। ");
    }

    #[test]
    fn unknown_voice_is_rejected() {
        assert_eq!(
            policy().normalize("hi", "unknown-Voice", "+0%", "+0Hz"),
            Err(ValidationError::VoiceNotAllowed)
        );
    }

    #[test]
    fn malformed_rate_and_pitch_are_rejected() {
        for rate in ["10", "+%", "ten%", "+1.5%", "++1%", ""] {
            assert_eq!(
                policy().normalize("hi", "en-US-AriaNeural", rate, "+0Hz"),
                Err(ValidationError::InvalidRate),
                "rate {rate:?}"
            );
        }

        for pitch in ["5", "+5hz", "+5 kHz", "Hz", "+5%"] {
            assert_eq!(
                policy().normalize("hi", "en-US-AriaNeural", "+0%", pitch),
                Err(ValidationError::InvalidPitch),
                "pitch {pitch:?}"
            );
        }
    }

    #[test]
    fn checks_short_circuit_in_order() {
        let p = policy();

        assert_eq!(p.normalize("", "nope", "x", "y"), Err(ValidationError::EmptyText));
        assert_eq!(p.normalize("abcdefghijkl", "nope", "x", "y"), Err(ValidationError::TextTooLong));
        assert_eq!(p.normalize("ok", "nope", "x", "y"), Err(ValidationError::VoiceNotAllowed));
        assert_eq!(p.normalize("ok", "en-US-AriaNeural", "x", "y"), Err(ValidationError::InvalidRate));
        assert_eq!(p.normalize("ok", "en-US-AriaNeural", "+1%", "y"), Err(ValidationError::InvalidPitch));
    }

    #[test]
    fn error_messages_match_the_wire_format() {
        assert_eq!(ValidationError::EmptyText.to_string(), "Empty text");
        assert_eq!(ValidationError::VoiceNotAllowed.to_string(), "Voice not allowed");
    }
}
