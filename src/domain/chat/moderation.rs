use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Marker substituted for every banned phrase match.
pub const REDACTION_MARKER: &str = "[conteúdo removido]";

/// Phrases redacted from assembled replies when moderation is enabled.
const BANNED_PHRASES: &[&str] = &["instruções ilegais", "bomba", "como fabricar"];

static BANNED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    BANNED_PHRASES
        .iter()
        .map(|phrase| {
            // Words of a phrase may be separated by any whitespace, including
            // the newline the assembler inserts between continuation
            // fragments.
            let words: Vec<String> = phrase
                .split_whitespace()
                .map(regex::escape)
                .collect();
            Regex::new(&format!("(?i){}", words.join(r"\s+")))
                .expect("banned phrase compiles to a valid pattern")
        })
        .collect()
});

/// Redact banned phrases from the fully assembled reply.
///
/// Runs exactly once per request, after assembly, so a phrase split across a
/// continuation boundary is still caught. Idempotent: the marker itself never
/// matches any banned phrase, so moderating already-moderated text is a no-op.
pub fn moderate(text: &str, enabled: bool) -> String {
    if !enabled {
        return text.to_string();
    }

    let mut moderated = text.to_string();
    for pattern in BANNED_PATTERNS.iter() {
        moderated = pattern.replace_all(&moderated, REDACTION_MARKER).into_owned();
    }

    if moderated != text {
        debug!("moderation redacted banned content");
    }

    moderated
}
