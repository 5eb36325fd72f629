/// Reduce a path to its final segment with whitespace and repeated dots
/// collapsed into single dots. Case and every other character are kept.
pub fn normalize_filename(input: &str) -> String {
    let is_separator = |c: char| c == '/' || c == '\\';
    let base = input
        .trim_end_matches(is_separator)
        .rsplit(is_separator)
        .next()
        .unwrap_or_default();

    let mut normalized = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if c.is_whitespace() { '.' } else { c };
        if c == '.' && normalized.ends_with('.') {
            continue;
        }
        normalized.push(c);
    }
    normalized
}

/// Turn a captured title token into display form
pub fn clean_title(raw: &str) -> String {
    raw.replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_directories() {
        assert_eq!(
            normalize_filename("/media/tv/Dark.Matter.S01E01.mkv"),
            "Dark.Matter.S01E01.mkv"
        );
        assert_eq!(
            normalize_filename(r"C:\Videos\Pulp.Fiction.1994.mp4"),
            "Pulp.Fiction.1994.mp4"
        );
        assert_eq!(normalize_filename("movies/Inception.2010/"), "Inception.2010");
    }

    #[test]
    fn test_whitespace_becomes_single_dot() {
        assert_eq!(
            normalize_filename("Dark Matter  2024\tS01E01 1080p x265-ELiTE.mkv"),
            "Dark.Matter.2024.S01E01.1080p.x265-ELiTE.mkv"
        );
    }

    #[test]
    fn test_repeated_dots_collapse() {
        assert_eq!(normalize_filename("The..Office...S03E07.mkv"), "The.Office.S03E07.mkv");
        assert_eq!(normalize_filename("The . Office.mkv"), "The.Office.mkv");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [
            "Dark.Matter.2024.S01E01.1080p.x265-ELiTE.mkv",
            "Some Movie  (2010) [1080p].mkv",
            "a..b  c",
            "",
        ] {
            let once = normalize_filename(input);
            assert_eq!(normalize_filename(&once), once);
        }
    }

    #[test]
    fn test_preserves_case_and_symbols() {
        assert_eq!(normalize_filename("WEB-DL_Mixed.Case"), "WEB-DL_Mixed.Case");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(normalize_filename(""), "");
        assert_eq!(normalize_filename(".mkv"), ".mkv");
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("Dark.Matter"), "Dark Matter");
        assert_eq!(clean_title(".The..Office."), "The Office");
        assert_eq!(clean_title("   "), "");
        assert_eq!(clean_title("MiXeD.case"), "MiXeD case");
    }
}
