// Corpus sampling with forced inclusion of query matches
use crate::normalize::normalize;
use crate::Item;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

/// Seed used when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Select a bounded working corpus from `catalog`.
///
/// Items whose normalized title contains any of `forced_queries` are always
/// kept and come first. The remaining items are sampled down to `target_size`
/// with a seeded RNG, keeping catalog order. Forced items may push the result
/// above `target_size`.
pub fn sample(
    catalog: &[Item],
    target_size: usize,
    forced_queries: &[String],
    seed: u64,
) -> Vec<Item> {
    let needles: Vec<String> = forced_queries
        .iter()
        .map(|q| normalize(q))
        .filter(|q| !q.trim().is_empty())
        .collect();

    let mut forced = Vec::new();
    let mut rest = Vec::new();
    for (idx, item) in catalog.iter().enumerate() {
        if needles.iter().any(|n| item.title_contains(n)) {
            forced.push(idx);
        } else {
            rest.push(idx);
        }
    }

    let sampled: Vec<usize> = if rest.len() > target_size {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked: Vec<usize> = rand::seq::index::sample(&mut rng, rest.len(), target_size)
            .into_iter()
            .map(|i| rest[i])
            .collect();
        picked.sort_unstable();
        picked
    } else {
        rest
    };

    let corpus: Vec<Item> = forced
        .iter()
        .chain(sampled.iter())
        .map(|&idx| catalog[idx].clone())
        .collect();

    info!(
        "Working corpus: {} books ({} forced, {} sampled from {})",
        corpus.len(),
        forced.len(),
        sampled.len(),
        catalog.len()
    );
    for needle in &needles {
        let count = corpus.iter().filter(|item| item.title_contains(needle)).count();
        debug!("'{}' books in corpus: {}", needle, count);
    }

    corpus
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(format!("Book number {}", i), format!("Author {}", i % 17)))
            .collect()
    }

    #[test]
    fn test_small_catalog_is_kept_whole() {
        let books = catalog(10);
        let corpus = sample(&books, 100, &[], DEFAULT_SEED);
        assert_eq!(corpus, books);
    }

    #[test]
    fn test_sampling_is_bounded_and_reproducible() {
        let books = catalog(1000);
        let a = sample(&books, 50, &[], DEFAULT_SEED);
        let b = sample(&books, 50, &[], DEFAULT_SEED);
        assert_eq!(a.len(), 50);
        assert_eq!(a, b);

        let c = sample(&books, 50, &[], 7);
        assert_ne!(a, c);
    }

    #[test]
    fn test_forced_items_always_present() {
        let mut books = catalog(5000);
        books[3917] = Item::new("Dune Messiah", "Frank Herbert");

        for seed in [1, 2, 3, DEFAULT_SEED] {
            let corpus = sample(&books, 100, &["Dune".to_string()], seed);
            assert_eq!(corpus.len(), 101);
            assert_eq!(corpus[0].title(), "Dune Messiah");
        }
    }

    #[test]
    fn test_forced_items_exceed_target() {
        let books = catalog(30);
        let corpus = sample(&books, 5, &["book".to_string()], DEFAULT_SEED);
        assert_eq!(corpus.len(), 30);
    }

    #[test]
    fn test_unmatched_forced_query_falls_back_to_plain_sampling() {
        let books = catalog(200);
        let forced = sample(&books, 20, &["zzzz".to_string()], DEFAULT_SEED);
        let plain = sample(&books, 20, &[], DEFAULT_SEED);
        assert_eq!(forced, plain);
    }

    #[test]
    fn test_item_matching_two_queries_is_kept_once() {
        let books = vec![Item::new("Harry Potter and the Ring", "X"), Item::new("Other", "Y")];
        let corpus = sample(&books, 10, &["potter".to_string(), "ring".to_string()], DEFAULT_SEED);
        assert_eq!(corpus.len(), 2);
    }
}
