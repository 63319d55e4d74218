//! Recursive synthetic entity generation.
//!
//! An [`EntityTemplate`] describes one row shape: a key column, simple
//! typed columns, term columns, term-list columns, and zero or more
//! embedded subconcepts. Subconcepts are pre-materialized into a
//! [`FlatRecordPool`] before the parent producer runs, and a pool template
//! can never carry subconcepts of its own, so nesting is bounded at one
//! level by construction rather than by a runtime depth check.
//!
//! Producers are lazy and conceptually infinite: the first item is always
//! the header, every following item one row.

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::mangle::mangle;
use crate::naming::{self, ColumnKind};
use crate::terms::TermPool;
use crate::{BenchError, BenchResult};

/// Smallest generated integer value, inclusive.
pub const MIN_INT: i64 = -99_999;
/// Largest generated integer value, inclusive.
pub const MAX_INT: i64 = 99_999;
/// Length of generated text values.
pub const TEXT_LEN: usize = 10;

// ── Templates ──────────────────────────────────────────────────────────

/// Ordered description of one entity row shape.
#[derive(Debug, Clone)]
pub struct EntityTemplate<'p> {
    label: String,
    kinds: Vec<ColumnKind>,
    term_pools: Vec<&'p TermPool>,
    term_list_pools: Vec<&'p TermPool>,
    max_list_choices: usize,
    subconcepts: Vec<&'p FlatRecordPool>,
}

impl<'p> EntityTemplate<'p> {
    /// Validates and builds a template.
    ///
    /// # Errors
    ///
    /// Returns a config error when the label is empty or contains the
    /// column separator, when a bound pool is empty, or when a subconcept
    /// pool holds no rows.
    pub fn new(
        label: impl Into<String>,
        kinds: Vec<ColumnKind>,
        term_pools: Vec<&'p TermPool>,
        term_list_pools: Vec<&'p TermPool>,
        max_list_choices: usize,
        subconcepts: Vec<&'p FlatRecordPool>,
    ) -> BenchResult<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(BenchError::Config(
                "entity label must not be empty".to_owned(),
            ));
        }
        if label.contains(naming::COLUMN_SEP) {
            return Err(BenchError::Config(format!(
                "entity label `{label}` must not contain `{}`",
                naming::COLUMN_SEP
            )));
        }
        if term_pools
            .iter()
            .chain(&term_list_pools)
            .any(|pool| pool.is_empty())
        {
            return Err(BenchError::Config(
                "bound term pools must not be empty".to_owned(),
            ));
        }
        if subconcepts.iter().any(|pool| pool.rows() == 0) {
            return Err(BenchError::Config(
                "subconcept pools must hold at least one row".to_owned(),
            ));
        }
        Ok(Self {
            label,
            kinds,
            term_pools,
            term_list_pools,
            max_list_choices,
            subconcepts,
        })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Total field count of one record, subconcept fields included.
    #[must_use]
    pub fn width(&self) -> usize {
        1 + self.kinds.len()
            + self.term_pools.len()
            + self.term_list_pools.len()
            + self.subconcepts.iter().map(|s| s.width()).sum::<usize>()
    }

    /// Header fields in record order: key, typed columns, term columns,
    /// term-list columns, then each subconcept's header spliced flat.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.width());
        header.push(naming::key_column(&self.label));
        for (i, kind) in self.kinds.iter().enumerate() {
            header.push(naming::typed_column(&self.label, *kind, i));
        }
        for i in 0..self.term_pools.len() {
            header.push(naming::term_column(&self.label, i));
        }
        for i in 0..self.term_list_pools.len() {
            header.push(naming::term_list_column(&self.label, i));
        }
        for sub in &self.subconcepts {
            header.extend_from_slice(sub.header());
        }
        header
    }

    /// Starts a producer over this template, consuming `rng`. Pass
    /// `&mut rng` to keep using a caller-owned generator.
    pub fn producer<R: Rng>(&self, rng: R) -> EntityProducer<'_, R> {
        EntityProducer {
            template: self,
            rng,
            next_key: 0,
            header_emitted: false,
        }
    }
}

// ── Producer ───────────────────────────────────────────────────────────

/// Lazy record producer. As an [`Iterator`] it yields the header first and
/// then rows indefinitely.
#[derive(Debug)]
pub struct EntityProducer<'t, R: Rng> {
    template: &'t EntityTemplate<'t>,
    rng: R,
    next_key: u64,
    header_emitted: bool,
}

impl<R: Rng> EntityProducer<'_, R> {
    /// Header fields; does not advance the row counter.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        self.template.header()
    }

    /// Produces the next row. Keys are a plain counter from zero, unique
    /// and strictly increasing for the producer's lifetime.
    pub fn next_row(&mut self) -> Vec<String> {
        let mut row = Vec::with_capacity(self.template.width());
        row.push(self.next_key.to_string());
        self.next_key += 1;

        for kind in &self.template.kinds {
            row.push(match kind {
                ColumnKind::Int => self.rng.gen_range(MIN_INT..=MAX_INT).to_string(),
                ColumnKind::Float => self.rng.gen::<f64>().to_string(),
                ColumnKind::Text => random_text(&mut self.rng),
            });
        }

        for pool in &self.template.term_pools {
            let term = pool.choose(&mut self.rng);
            row.push(mangle(&mut self.rng, term));
        }

        for pool in &self.template.term_list_pools {
            let count = self.rng.gen_range(0..=self.template.max_list_choices);
            let mut value = String::new();
            for i in 0..count {
                if i > 0 {
                    value.push(naming::LIST_DELIMITER);
                }
                let term = pool.choose(&mut self.rng);
                let element = mangle(&mut self.rng, term);
                value.push_str(&element);
            }
            row.push(value);
        }

        for sub in &self.template.subconcepts {
            row.extend_from_slice(sub.choose(&mut self.rng));
        }

        row
    }
}

impl<R: Rng> Iterator for EntityProducer<'_, R> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Vec<String>> {
        if !self.header_emitted {
            self.header_emitted = true;
            return Some(self.header());
        }
        Some(self.next_row())
    }
}

fn random_text<R: Rng>(rng: &mut R) -> String {
    (0..TEXT_LEN)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}

// ── Subconcept pools ───────────────────────────────────────────────────

/// Pre-materialized rows for one subconcept label. Read-only while a
/// parent producer samples from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRecordPool {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl FlatRecordPool {
    /// Drives `template` for `row_count` rows.
    ///
    /// # Errors
    ///
    /// Returns a config error when the template embeds subconcepts of its
    /// own, or when `row_count` is zero.
    pub fn materialize<R: Rng>(
        template: &EntityTemplate<'_>,
        row_count: usize,
        rng: R,
    ) -> BenchResult<Self> {
        if !template.subconcepts.is_empty() {
            return Err(BenchError::Config(
                "subconcept templates must not embed subconcepts of their own".to_owned(),
            ));
        }
        if row_count == 0 {
            return Err(BenchError::Config(
                "subconcept pools need at least one row".to_owned(),
            ));
        }
        let mut producer = template.producer(rng);
        let header = producer.header();
        let rows = (0..row_count).map(|_| producer.next_row()).collect();
        Ok(Self { header, rows })
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Number of materialized rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn records(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// One uniform draw, with replacement across calls.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> &[String] {
        &self.rows[rng.gen_range(0..self.rows.len())]
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn term_source() -> Vec<String> {
        (0..20).map(|i| format!("vocab{i:02}")).collect()
    }

    fn all_kinds() -> Vec<ColumnKind> {
        vec![ColumnKind::Text, ColumnKind::Int, ColumnKind::Float]
    }

    #[test]
    fn test_header_layout_and_width() {
        let mut rng = StdRng::seed_from_u64(41);
        let source = term_source();
        let terms = TermPool::sample(&source, 8, &mut rng).unwrap();
        let lists = TermPool::sample(&source, 8, &mut rng).unwrap();

        let sub_template = EntityTemplate::new(
            naming::subconcept_label(0),
            all_kinds(),
            vec![&terms],
            vec![&lists],
            2,
            vec![],
        )
        .unwrap();
        let sub_pool = FlatRecordPool::materialize(&sub_template, 5, &mut rng).unwrap();

        let template = EntityTemplate::new(
            "data",
            all_kinds(),
            vec![&terms],
            vec![&lists],
            2,
            vec![&sub_pool],
        )
        .unwrap();

        let header = template.header();
        assert_eq!(header.len(), template.width());
        assert_eq!(header.len(), 12);
        assert_eq!(header[0], "data:key");
        assert_eq!(header[1], "data:text:0");
        assert_eq!(header[2], "data:int:1");
        assert_eq!(header[3], "data:float:2");
        assert_eq!(header[4], "data:term:0");
        assert_eq!(header[5], "data:termlist:0");
        assert_eq!(header[6], "subc0:key");
        assert_eq!(header[11], "subc0:termlist:0");
    }

    #[test]
    fn test_iterator_yields_header_then_rows() {
        let template = EntityTemplate::new("data", all_kinds(), vec![], vec![], 0, vec![]).unwrap();
        let rng = StdRng::seed_from_u64(43);
        let mut items = template.producer(rng);

        let header = items.next().unwrap();
        assert_eq!(header, template.header());
        let row = items.next().unwrap();
        assert_eq!(row.len(), template.width());
        assert_eq!(row[0], "0");
    }

    #[test]
    fn test_keys_are_contiguous_from_zero() {
        let template = EntityTemplate::new("data", all_kinds(), vec![], vec![], 0, vec![]).unwrap();
        let rng = StdRng::seed_from_u64(47);
        let mut producer = template.producer(rng);
        for expected in 0..50u64 {
            let row = producer.next_row();
            assert_eq!(row[0], expected.to_string());
        }
    }

    #[test]
    fn test_simple_value_shapes() {
        let template = EntityTemplate::new("data", all_kinds(), vec![], vec![], 0, vec![]).unwrap();
        let rng = StdRng::seed_from_u64(53);
        let mut producer = template.producer(rng);
        for _ in 0..200 {
            let row = producer.next_row();

            let text = &row[1];
            assert_eq!(text.chars().count(), TEXT_LEN);
            assert!(text.chars().all(|c| c.is_ascii_alphanumeric()));

            let int: i64 = row[2].parse().unwrap();
            assert!((MIN_INT..=MAX_INT).contains(&int));

            let float: f64 = row[3].parse().unwrap();
            assert!((0.0..1.0).contains(&float));
        }
    }

    #[test]
    fn test_term_list_counts_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(59);
        let source = term_source();
        let lists = TermPool::sample(&source, 10, &mut rng).unwrap();
        let template =
            EntityTemplate::new("data", vec![], vec![], vec![&lists], 3, vec![]).unwrap();
        let mut producer = template.producer(&mut rng);

        let mut saw_empty = false;
        let mut saw_full = false;
        for _ in 0..300 {
            let row = producer.next_row();
            let value = &row[1];
            let tokens = if value.is_empty() {
                0
            } else {
                value.split(naming::LIST_DELIMITER).count()
            };
            assert!(tokens <= 3, "value {value:?} has {tokens} tokens");
            saw_empty |= tokens == 0;
            saw_full |= tokens == 3;
        }
        assert!(saw_empty && saw_full, "selection count never hit the bounds");
    }

    #[test]
    fn test_subconcept_records_spliced_verbatim() {
        let mut rng = StdRng::seed_from_u64(61);
        let source = term_source();
        let terms = TermPool::sample(&source, 6, &mut rng).unwrap();

        let sub_template = EntityTemplate::new(
            naming::subconcept_label(0),
            vec![ColumnKind::Int],
            vec![&terms],
            vec![],
            0,
            vec![],
        )
        .unwrap();
        let sub_pool = FlatRecordPool::materialize(&sub_template, 4, &mut rng).unwrap();
        let known: HashSet<Vec<String>> = sub_pool.records().iter().cloned().collect();

        let template =
            EntityTemplate::new("data", vec![], vec![], vec![], 0, vec![&sub_pool]).unwrap();
        let mut producer = template.producer(&mut rng);
        for _ in 0..40 {
            let row = producer.next_row();
            let spliced = row[1..].to_vec();
            assert!(known.contains(&spliced), "unknown subconcept record {spliced:?}");
        }
    }

    #[test]
    fn test_materialize_rejects_nested_subconcepts() {
        let mut rng = StdRng::seed_from_u64(67);
        let inner_template =
            EntityTemplate::new("subc0", vec![ColumnKind::Int], vec![], vec![], 0, vec![]).unwrap();
        let inner = FlatRecordPool::materialize(&inner_template, 2, &mut rng).unwrap();

        let nested =
            EntityTemplate::new("subc1", vec![ColumnKind::Int], vec![], vec![], 0, vec![&inner])
                .unwrap();
        let err = FlatRecordPool::materialize(&nested, 2, &mut rng).unwrap_err();
        assert!(err.to_string().contains("subconcepts of their own"));
    }

    #[test]
    fn test_label_with_separator_rejected() {
        let err =
            EntityTemplate::new("da:ta", vec![], vec![], vec![], 0, vec![]).unwrap_err();
        assert!(err.to_string().contains("must not contain"));
    }

    #[test]
    fn test_same_seed_same_rows() {
        let source = term_source();
        let mut seed_rng = StdRng::seed_from_u64(71);
        let terms = TermPool::sample(&source, 8, &mut seed_rng).unwrap();
        let template =
            EntityTemplate::new("data", all_kinds(), vec![&terms], vec![], 0, vec![]).unwrap();

        let mut a = template.producer(StdRng::seed_from_u64(99));
        let mut b = template.producer(StdRng::seed_from_u64(99));
        for _ in 0..5 {
            assert_eq!(a.next_row(), b.next_row());
        }
    }
}
