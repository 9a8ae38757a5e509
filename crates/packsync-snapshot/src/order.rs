//! Natural, case-insensitive path ordering.
//!
//! Mirrors how file browsers list names: `take 2.wav` before `take 10.wav`,
//! `Audio` next to `audio`. Runs of ASCII digits compare by numeric value,
//! everything else compares by lowercased character.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare two strings in natural, case-insensitive order.
///
/// Strings that are equal under that comparison (`A.txt` vs `a.txt`,
/// `01` vs `1`) are ordered by their raw bytes, so the result is a total
/// order and sorting never depends on input order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_fold_cmp(a, b).then_with(|| a.cmp(b))
}

fn natural_fold_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        let (l, r) = match (left.peek(), right.peek()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(&l), Some(&r)) => (l, r),
        };

        let ord = if l.is_ascii_digit() && r.is_ascii_digit() {
            let l_run = take_digits(&mut left);
            let r_run = take_digits(&mut right);
            cmp_digit_runs(&l_run, &r_run)
        } else {
            left.next();
            right.next();
            fold(l).cmp(&fold(r))
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare digit runs by value without parsing (runs may exceed `u64`).
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut names: Vec<&str>) -> Vec<&str> {
        names.sort_by(|a, b| natural_cmp(a, b));
        names
    }

    #[test]
    fn test_numeric_runs_compare_by_value() {
        assert_eq!(
            sorted(vec!["take 10.wav", "take 2.wav", "take 1.wav"]),
            vec!["take 1.wav", "take 2.wav", "take 10.wav"]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            sorted(vec!["beta", "Alpha", "alpha2", "Gamma"]),
            vec!["Alpha", "alpha2", "beta", "Gamma"]
        );
    }

    #[test]
    fn test_case_only_difference_is_still_ordered() {
        assert_eq!(natural_cmp("A.txt", "a.txt"), Ordering::Less);
        assert_eq!(natural_cmp("a.txt", "A.txt"), Ordering::Greater);
        assert_eq!(natural_cmp("a.txt", "a.txt"), Ordering::Equal);
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(natural_fold_cmp("v01", "v1"), Ordering::Equal);
        assert_ne!(natural_cmp("v01", "v1"), Ordering::Equal);
        assert_eq!(natural_cmp("v002", "v10"), Ordering::Less);
    }

    #[test]
    fn test_huge_numbers() {
        assert_eq!(
            natural_cmp("x99999999999999999999999", "x100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(natural_cmp("Media", "Media/a.wav"), Ordering::Less);
    }

    #[test]
    fn test_sort_is_independent_of_input_order() {
        let names = vec!["b10", "B2", "a", "A", "b2", "b01"];
        let mut reversed = names.clone();
        reversed.reverse();
        assert_eq!(sorted(names), sorted(reversed));
    }
}
