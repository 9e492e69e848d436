//! Name normalization and similarity scoring.
//!
//! The registry sees the same building under many spellings — transliterated
//! names, added qualifiers, truncated forms. Scoring is deliberately cheap
//! and deterministic: normalized equality, containment ratio, then token
//! Jaccard. No fuzzy edit distances.

/// Minimum token length kept for Jaccard comparison.
const MIN_TOKEN_LEN: usize = 2;

/// Lowercase, strip everything that is not alphanumeric or a space, collapse
/// runs of whitespace, trim. Idempotent.
pub fn normalize(name: &str) -> String {
    let lowered: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity in `[0, 1]`:
/// 1. equal after normalization → 1.0
/// 2. one normalized name contains the other → shorter/longer length ratio
/// 3. otherwise Jaccard index over tokens longer than two characters
pub fn similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);

    if na == nb {
        return 1.0;
    }

    if !na.is_empty() && !nb.is_empty() && (na.contains(&nb) || nb.contains(&na)) {
        let (len_a, len_b) = (na.chars().count(), nb.chars().count());
        let (shorter, longer) = if len_a <= len_b {
            (len_a, len_b)
        } else {
            (len_b, len_a)
        };
        return shorter as f64 / longer as f64;
    }

    let tokens_a = significant_tokens(&na);
    let tokens_b = significant_tokens(&nb);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.iter().filter(|t| tokens_b.contains(*t)).count();
    let union = tokens_a.len() + tokens_b.len() - intersection;
    intersection as f64 / union as f64
}

/// Exact match after normalization.
pub fn exact_normalized_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Stricter cross-name aliasing check: compare "base names" with
/// parenthetical/bracketed suffixes and trailing dash-qualifiers stripped.
/// True when the bases are equal, or one contains the other with a length
/// ratio of at least 0.6 and both bases at least 5 characters long.
pub fn shares_significant_portion(a: &str, b: &str) -> bool {
    let base_a = base_name(a);
    let base_b = base_name(b);

    if base_a.is_empty() || base_b.is_empty() {
        return false;
    }
    if base_a == base_b {
        return true;
    }
    let (len_a, len_b) = (base_a.chars().count(), base_b.chars().count());
    if len_a < 5 || len_b < 5 {
        return false;
    }
    if !(base_a.contains(&base_b) || base_b.contains(&base_a)) {
        return false;
    }
    let (shorter, longer) = if len_a <= len_b {
        (len_a, len_b)
    } else {
        (len_b, len_a)
    };
    shorter as f64 / longer as f64 >= 0.6
}

/// Strip "(…)" / "[…]" suffixes and a trailing " - qualifier", then normalize.
fn base_name(name: &str) -> String {
    let mut base = name;
    if let Some(pos) = base.find('(') {
        base = &base[..pos];
    }
    if let Some(pos) = base.find('[') {
        base = &base[..pos];
    }
    if let Some(pos) = base.find(" - ") {
        base = &base[..pos];
    }
    normalize(base)
}

fn significant_tokens(normalized: &str) -> std::collections::HashSet<&str> {
    normalized
        .split_whitespace()
        .filter(|t| t.len() > MIN_TOKEN_LEN)
        .collect()
}
