/// Recognized video codec tokens, checked in this order within a token
pub const CODECS: &[&str] = &[
    "x264", "x265", "h264", "h265", "hevc", "avc", "xvid", "divx", "vp8", "vp9", "av1", "mpeg2",
    "mpeg4",
];

/// Find the first vocabulary codec inside a token, returning its byte range
fn find_codec(token: &str) -> Option<(usize, usize)> {
    let lower = token.to_ascii_lowercase();
    CODECS
        .iter()
        .find_map(|codec| lower.find(codec).map(|start| (start, start + codec.len())))
}

/// Split the combined source capture into release tokens and a codec.
///
/// Only the first codec-bearing token contributes a codec; from that token
/// just the release group fragment after the codec survives. Every other
/// token is kept as is. Both values are empty when nothing applies.
pub fn extract_source_and_codec(combined: &str) -> (String, String) {
    let mut codec = String::new();
    let mut source_parts: Vec<&str> = Vec::new();

    for token in combined.split('.').map(str::trim).filter(|t| !t.is_empty()) {
        if codec.is_empty() {
            if let Some((start, end)) = find_codec(token) {
                codec = token[start..end].to_string();
                let rest = &token[end..];
                let group = rest.strip_prefix(|c| c == '-' || c == '.').unwrap_or(rest);
                if !group.is_empty() {
                    source_parts.push(group);
                }
                continue;
            }
        }
        source_parts.push(token);
    }

    (source_parts.join("."), codec)
}
