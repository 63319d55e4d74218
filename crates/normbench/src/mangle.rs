//! Probabilistic string mangler for term-column noise injection.
//!
//! Each call draws one uniform value and applies exactly one operation.
//! The bands are fixed: generated fixtures depend on roughly half of all
//! term values surviving unmodified, so the identity band stays the
//! majority.

use rand::Rng;

const ASCII_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Applies one randomly selected mutation to `s`.
///
/// Bands over one uniform draw in `[0, 1)`:
/// - `[0.0, 0.1)` uppercase the whole string
/// - `[0.1, 0.2)` lowercase the whole string
/// - `[0.2, 0.3)` append one to three trailing spaces
/// - `[0.3, 0.4)` insert a random ASCII letter at a random position
/// - `[0.4, 0.5)` delete the character at a random position; a position
///   past the last character leaves the string unchanged
/// - `[0.5, 1.0)` identity
///
/// Total for every input, including the empty string. Operates on char
/// boundaries, so non-ASCII terms are safe.
pub fn mangle<R: Rng>(rng: &mut R, s: &str) -> String {
    let r: f64 = rng.gen();
    if r < 0.1 {
        s.to_uppercase()
    } else if r < 0.2 {
        s.to_lowercase()
    } else if r < 0.3 {
        let pad = rng.gen_range(1..=3);
        let mut out = String::with_capacity(s.len() + pad);
        out.push_str(s);
        for _ in 0..pad {
            out.push(' ');
        }
        out
    } else if r < 0.4 {
        let chars: Vec<char> = s.chars().collect();
        let at = rng.gen_range(0..=chars.len());
        let letter = ASCII_LETTERS[rng.gen_range(0..ASCII_LETTERS.len())] as char;
        let mut out: String = chars[..at].iter().collect();
        out.push(letter);
        out.extend(&chars[at..]);
        out
    } else if r < 0.5 {
        let chars: Vec<char> = s.chars().collect();
        let at = rng.gen_range(0..=chars.len());
        if at == chars.len() {
            s.to_owned()
        } else {
            let mut out: String = chars[..at].iter().collect();
            out.extend(&chars[at + 1..]);
            out
        }
    } else {
        s.to_owned()
    }
}
