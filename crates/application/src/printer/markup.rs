//! Raw byte insertions into transcoded text
//!
//! Callers embed `{::escper}key{:/}` in their text; after transcoding, each
//! token is swapped for the raw bytes supplied under `key`. The inserted bytes
//! are never transcoded, which is how ESC/POS control sequences (logos, cash
//! drawer pulses, barcodes) ride along with localized text.

use std::collections::HashMap;

use domain::{Codepage, Transcoder};

pub const MARKUP_OPEN: &str = "{::escper}";
pub const MARKUP_CLOSE: &str = "{:/}";

/// Raw insertions keyed by markup key
pub type Insertions = HashMap<String, Vec<u8>>;

/// Textual token for `key`, e.g. `{::escper}logo{:/}`
pub fn markup_token(key: &str) -> String {
    format!("{}{}{}", MARKUP_OPEN, key, MARKUP_CLOSE)
}

/// Transcode `text` for `codepage`, then substitute every insertion token
///
/// Tokens without a matching insertion are left in place.
pub fn merge_texts(
    transcoder: &dyn Transcoder,
    text: &str,
    insertions: &Insertions,
    codepage: Codepage,
) -> Vec<u8> {
    let mut merged = transcoder.transcode(codepage, text);
    for (key, value) in insertions {
        // The token went through the transcoder along with the text
        let token = transcoder.transcode(codepage, &markup_token(key));
        merged = replace_all(&merged, &token, value);
    }
    merged
}

fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return haystack.to_vec();
    }

    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(replacement);
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}
