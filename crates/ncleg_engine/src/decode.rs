use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding: &'static str,
    /// Some bytes were invalid in `encoding` and became U+FFFD.
    pub lossy: bool,
}

/// Decode a fetched page to UTF-8.
///
/// Order of precedence: byte order mark, then the `charset` parameter of the
/// Content-Type header, then a guess from the bytes. Older bill pages are
/// served as windows-1252 without a charset, so the guess matters.
///
/// Invalid sequences are replaced rather than rejected; `lossy` says so.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| content_type.and_then(charset_from_content_type))
        .unwrap_or_else(|| guess_encoding(bytes));

    let (text, _, had_errors) = encoding.decode(bytes);
    DecodedPage {
        html: text.into_owned(),
        encoding: encoding.name(),
        lossy: had_errors,
    }
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let label = value.trim().trim_matches(['"', '\''].as_ref());
        Encoding::for_label(label.as_bytes())
    })
}

fn guess_encoding(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}
