//! Go struct tags.
//!
//! A tag is the raw string after a field declaration, conventionally a
//! space-separated list of `key:"value"` pairs. Lookup follows the rules of
//! Go's `reflect.StructTag.Lookup`: keys are runs of non-control, non-space,
//! non-quote, non-colon characters and values are double-quoted Go strings.

/// A struct tag with its surrounding quotes already removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructTag(pub String);

impl StructTag {
    pub fn new(raw: impl Into<String>) -> Self {
        StructTag(raw.into())
    }

    /// Value associated with `key`, if present and well formed.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut tag = self.0.as_str();

        loop {
            tag = tag.trim_start_matches(' ');
            if tag.is_empty() {
                return None;
            }

            let name_len = tag
                .char_indices()
                .find(|&(_, c)| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
                .map(|(i, _)| i)
                .unwrap_or(tag.len());
            if name_len == 0 || !tag[name_len..].starts_with(":\"") {
                return None;
            }
            let name = &tag[..name_len];
            tag = &tag[name_len + 1..];

            // Scan the quoted value, honouring backslash escapes.
            let bytes = tag.as_bytes();
            let mut i = 1;
            while i < bytes.len() && bytes[i] != b'"' {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= bytes.len() {
                return None;
            }
            let quoted = &tag[..=i];
            tag = &tag[i + 1..];

            if name == key {
                return unquote(quoted);
            }
        }
    }
}

/// Decode a double-quoted Go string literal with the common escapes.
pub(crate) fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            _ => return None,
        }
    }
    Some(out)
}
