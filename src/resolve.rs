//! Classify a free-form Bilibili URL into one of the identifier schemes the
//! platform APIs accept.

use std::fmt;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;

static EPISODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ep(?:_id=)?([0-9]+)").expect("valid episode pattern"));
static BVID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(BV[1-9A-HJ-NP-Za-km-z]+)").expect("valid bvid pattern")
});
static AVID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)av([0-9]+)").expect("valid avid pattern"));
static SEASON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ss(?:eason_id=)?([0-9]+)").expect("valid season pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Bangumi episode, `ep123` or `ep_id=123`.
    Episode,
    /// Base-58 video id, `BV1xx411c7mD`.
    Bvid,
    /// Legacy numeric video id, `av170001`.
    Avid,
    /// Bangumi season, `ss123`.
    Season,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IdKind::Episode => "epid",
            IdKind::Bvid => "bvid",
            IdKind::Avid => "avid",
            IdKind::Season => "ssid",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub kind: IdKind,
    pub value: String,
}

/// Match `raw` against the known id patterns in priority order
/// (episode, bvid, avid, season) and return the first hit.
///
/// # Example
/// ```
/// use danmaku_analysis::{IdKind, resolve_identifier};
/// let id = resolve_identifier("https://www.bilibili.com/video/BV1xx411c7mD").unwrap();
/// assert_eq!(id.kind, IdKind::Bvid);
/// assert_eq!(id.value, "BV1xx411c7mD");
/// assert!(resolve_identifier("not a url").is_none());
/// ```
pub fn resolve_identifier(raw: &str) -> Option<Identifier> {
    if raw.is_empty() {
        warn!("Empty URL, nothing to resolve");
        return None;
    }

    let patterns: [(IdKind, &Regex); 4] = [
        (IdKind::Episode, &EPISODE_RE),
        (IdKind::Bvid, &BVID_RE),
        (IdKind::Avid, &AVID_RE),
        (IdKind::Season, &SEASON_RE),
    ];

    let found = patterns.iter().find_map(|(kind, re)| {
        let value = re.captures(raw)?.get(1)?.as_str().to_string();
        Some(Identifier { kind: *kind, value })
    });

    if found.is_none() {
        warn!("No Bilibili id pattern found in '{raw}'");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(raw: &str) -> (IdKind, String) {
        let id = resolve_identifier(raw).unwrap();
        (id.kind, id.value)
    }

    #[test]
    fn recognizes_each_scheme() {
        assert_eq!(
            resolved("https://www.bilibili.com/video/BV1xx411c7mD"),
            (IdKind::Bvid, "BV1xx411c7mD".to_string())
        );
        assert_eq!(
            resolved("https://www.bilibili.com/bangumi/play/ep374717"),
            (IdKind::Episode, "374717".to_string())
        );
        assert_eq!(
            resolved("https://api.example/view?ep_id=42"),
            (IdKind::Episode, "42".to_string())
        );
        assert_eq!(
            resolved("https://www.bilibili.com/video/av170001"),
            (IdKind::Avid, "170001".to_string())
        );
        assert_eq!(
            resolved("https://www.bilibili.com/bangumi/play/ss33802"),
            (IdKind::Season, "33802".to_string())
        );
    }

    #[test]
    fn bvid_and_avid_are_case_insensitive() {
        assert_eq!(resolved("bv1xx411c7mD").0, IdKind::Bvid);
        assert_eq!(resolved("AV12345"), (IdKind::Avid, "12345".to_string()));
    }

    #[test]
    fn episode_wins_over_bvid() {
        let (kind, value) = resolved("https://www.bilibili.com/video/BV1xx411c7mD?from=ep99");
        assert_eq!(kind, IdKind::Episode);
        assert_eq!(value, "99");
    }

    #[test]
    fn unrecognized_and_empty_input() {
        assert!(resolve_identifier("not a url").is_none());
        assert!(resolve_identifier("").is_none());
        assert!(resolve_identifier("https://example.com/watch").is_none());
    }
}
