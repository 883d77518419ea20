use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padding optional.
pub const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
/// URL-safe alphabet, padding optional.
pub const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Decodes `input` as UTF-8 text, trying the standard alphabet first and
/// the URL-safe one second.
///
/// Returns `None` when neither alphabet accepts the input or the result is
/// not valid UTF-8.
pub fn decode_lenient(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    [STANDARD_LENIENT, URL_SAFE_LENIENT]
        .iter()
        .find_map(|engine| {
            engine
                .decode(input)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
}

/// Like [`decode_lenient`] but ignores any whitespace inside the input,
/// which subscription bodies often wrap at fixed widths.
pub fn decode_body(input: &str) -> Option<String> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    decode_lenient(&compact)
}

/// Encodes a string to URL-safe Base64 without padding.
pub fn url_safe_base64_encode(input: &str) -> String {
    URL_SAFE_NO_PAD.encode(input)
}
