//! Term sources and sampled term pools.
//!
//! A term source is a newline-delimited vocabulary file. Each term column
//! of a dataset is backed by a [`TermPool`]: a fixed-size sample drawn from
//! the source without replacement when the dataset is assembled, then read
//! only.

use std::path::Path;

use rand::Rng;
use rand::seq::index;

use crate::{BenchError, BenchResult};

/// Loads a term source: one term per line, empty lines skipped.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn load_term_source(path: &Path) -> BenchResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// A fixed sample of terms backing one term column. Non-empty by
/// construction, so draws are infallible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPool {
    terms: Vec<String>,
}

impl TermPool {
    /// Draws `size` distinct terms from `source` without replacement.
    ///
    /// # Errors
    ///
    /// Returns a config error when `size` is zero or exceeds the source.
    pub fn sample<R: Rng>(source: &[String], size: usize, rng: &mut R) -> BenchResult<Self> {
        if size == 0 {
            return Err(BenchError::Config(
                "term sample size must be at least 1".to_owned(),
            ));
        }
        if size > source.len() {
            return Err(BenchError::Config(format!(
                "term sample size {size} exceeds source size {}",
                source.len()
            )));
        }
        let terms = index::sample(rng, source.len(), size)
            .into_iter()
            .map(|i| source[i].clone())
            .collect();
        Ok(Self { terms })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// One uniform draw.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> &str {
        &self.terms[rng.gen_range(0..self.terms.len())]
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::io::Write;

    fn source(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("term{i:03}")).collect()
    }

    #[test]
    fn test_load_term_source_skips_empty_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "alpha").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "beta").unwrap();
        write!(file, "gamma").unwrap();
        drop(file);

        let terms = load_term_source(&path).unwrap();
        assert_eq!(terms, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_sample_is_without_replacement() {
        let mut rng = StdRng::seed_from_u64(23);
        let pool = TermPool::sample(&source(50), 20, &mut rng).unwrap();
        assert_eq!(pool.len(), 20);

        let mut seen = pool.terms().to_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 20, "sampled terms must be distinct");
    }

    #[test]
    fn test_sample_rejects_oversized_request() {
        let mut rng = StdRng::seed_from_u64(29);
        let err = TermPool::sample(&source(5), 6, &mut rng).unwrap_err();
        assert!(err.to_string().contains("exceeds source size"));
    }

    #[test]
    fn test_sample_rejects_zero() {
        let mut rng = StdRng::seed_from_u64(31);
        assert!(TermPool::sample(&source(5), 0, &mut rng).is_err());
    }

    #[test]
    fn test_choose_returns_members() {
        let mut rng = StdRng::seed_from_u64(37);
        let src = source(10);
        let pool = TermPool::sample(&src, 4, &mut rng).unwrap();
        for _ in 0..100 {
            let term = pool.choose(&mut rng).to_owned();
            assert!(pool.terms().contains(&term));
        }
    }
}
