use std::borrow::Cow;

/// Decodes HTML character references (`&amp;`, `&#39;`, `&#x2192;`, ...) into Unicode.
///
/// Label text is authored as markup, so `&lt;b&gt;` must display as `<b>` rather than be parsed
/// as a tag. Decoding happens after tokenizing, on text runs and attribute values only.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    // Fast path: nothing to decode.
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    Cow::Owned(htmlize::unescape(input).into_owned())
}
