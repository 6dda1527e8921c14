//! Best-effort byte decoding for uploaded documents.
//!
//! Runs an encoding-detection heuristic first, then a fixed fallback list
//! (UTF-8, Latin-1, Windows-1252). Latin-1 maps every byte, so the chain
//! cannot run dry in practice; the error variant exists for contract
//! completeness.

use chardetng::EncodingDetector;
use thiserror::Error;

/// Fallback candidates, tried in order when detection fails to decode.
const FALLBACK_ENCODINGS: [&str; 3] = ["utf-8", "latin-1", "windows-1252"];

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unable to decode document: {0}")]
    Undecodable(String),
}

/// A successfully decoded byte sequence.
///
/// `via_fallback` names the fallback slot that decoded the bytes, so
/// callers can log when the detection heuristic was overruled; `None`
/// means the detected encoding decoded cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: String,
    pub via_fallback: Option<usize>,
}

/// Decode raw document bytes into text.
///
/// Detection first; on a dirty decode, the fallback chain. Total for any
/// input thanks to the Latin-1 slot.
pub fn decode(raw: &[u8]) -> Result<DecodedText, DecodeError> {
    let mut detector = EncodingDetector::new();
    detector.feed(raw, true);
    let guessed = detector.guess(None, true);

    let (text, had_errors) = guessed.decode_without_bom_handling(raw);
    if !had_errors {
        return Ok(DecodedText {
            text: text.into_owned(),
            encoding: guessed.name().to_ascii_lowercase(),
            via_fallback: None,
        });
    }

    tracing::debug!(
        guessed = %guessed.name(),
        len = raw.len(),
        "Detected encoding did not decode cleanly, trying fallbacks"
    );

    decode_fallback(raw)
}

/// Try the fixed candidate list in order, accepting the first clean decode.
fn decode_fallback(raw: &[u8]) -> Result<DecodedText, DecodeError> {
    for (slot, name) in FALLBACK_ENCODINGS.iter().enumerate() {
        if let Some(text) = try_candidate(name, raw) {
            return Ok(DecodedText {
                text,
                encoding: name.to_string(),
                via_fallback: Some(slot),
            });
        }
    }

    // Unreachable through the chain above (Latin-1 is total), kept so the
    // contract reports exhaustion rather than panicking if the list changes.
    Err(DecodeError::Undecodable(format!(
        "no candidate encoding decoded {} bytes",
        raw.len()
    )))
}

fn try_candidate(name: &str, raw: &[u8]) -> Option<String> {
    match name {
        "utf-8" => std::str::from_utf8(raw).ok().map(str::to_owned),
        // Latin-1 is a total single-byte mapping; this cannot fail.
        "latin-1" => Some(raw.iter().map(|&b| char::from(b)).collect()),
        "windows-1252" => {
            let (text, had_errors) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(raw);
            (!had_errors).then(|| text.into_owned())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_utf8_decodes_exactly() {
        let input = "Grüße, 契約, здравствуйте";
        let decoded = decode(input.as_bytes()).unwrap();
        assert_eq!(decoded.text, input);
    }

    #[test]
    fn empty_input_decodes_to_empty_string() {
        let decoded = decode(b"").unwrap();
        assert_eq!(decoded.text, "");
    }

    #[test]
    fn decode_is_total_for_any_byte_value() {
        let every_byte: Vec<u8> = (0u8..=255).collect();
        let decoded = decode(&every_byte).expect("decode must always produce text");
        assert!(!decoded.text.is_empty());

        // The fallback chain alone is also total, via the Latin-1 slot.
        let via_fallback = decode_fallback(&every_byte).unwrap();
        assert_eq!(via_fallback.text.chars().count(), 256);
    }

    #[test]
    fn non_utf8_byte_maps_to_latin1_character() {
        // 0xE9 is é in both Latin-1 and Windows-1252.
        let decoded = decode(b"Hello Enc\xe9").unwrap();
        assert_eq!(decoded.text, "Hello Encé");
    }

    #[test]
    fn fallback_chain_prefers_utf8() {
        let decoded = decode_fallback("plain ascii".as_bytes()).unwrap();
        assert_eq!(decoded.encoding, "utf-8");
        assert_eq!(decoded.via_fallback, Some(0));
    }

    #[test]
    fn fallback_chain_reaches_latin1_for_invalid_utf8() {
        let decoded = decode_fallback(b"Hello Enc\xe9").unwrap();
        assert_eq!(decoded.encoding, "latin-1");
        assert_eq!(decoded.via_fallback, Some(1));
        assert_eq!(decoded.text, "Hello Encé");
    }

    #[test]
    fn latin1_c1_range_is_preserved_as_controls() {
        // 0x81 is undefined in Windows-1252 but total under Latin-1; the
        // chain order keeps the source's Latin-1-wins behavior.
        let decoded = decode_fallback(b"\x81\xfe").unwrap();
        assert_eq!(decoded.encoding, "latin-1");
        assert_eq!(decoded.text, "\u{81}þ");
    }
}
