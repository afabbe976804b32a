//! Nearest-match substitution of OCR text against recognizer output.

pub const DEFAULT_SIMILARITY_CUTOFF: f64 = 0.6;

/// Ratcliff/Obershelp similarity in `[0, 1]`: twice the number of matched characters
/// over the combined length. Matches are found by taking the longest common block and
/// recursing on the pieces to either side of it. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matched_chars(&a[..i], &b[..j]) + matched_chars(&a[i + size..], &b[j + size..])
}

/// Longest common block as `(start in a, start in b, length)`. Among equally long
/// blocks the one starting earliest in `a`, then earliest in `b`, wins.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let k = row[j + 1];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut row);
    }
    best
}

/// The candidate most similar to `text`, if its similarity reaches `cutoff`.
/// Ties go to the earlier candidate.
pub fn closest_match<'a, S: AsRef<str>>(text: &str, candidates: &'a [S], cutoff: f64) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let similarity = similarity(candidate, text);
        if similarity < cutoff {
            continue;
        }
        if best.is_none_or(|(_, score)| similarity > score) {
            best = Some((candidate, similarity));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Replace each text with its closest candidate, keeping the original when no
/// candidate clears the cutoff.
pub fn correct_texts<S: AsRef<str>>(originals: &[S], candidates: &[String], cutoff: f64) -> Vec<String> {
    originals
        .iter()
        .map(|original| {
            let original = original.as_ref();
            match closest_match(original, candidates, cutoff) {
                Some(replacement) => {
                    if replacement != original {
                        tracing::debug!(from = original, to = replacement, "substituted low-confidence span");
                    }
                    replacement.to_string()
                }
                None => original.to_string(),
            }
        })
        .collect()
}
