//! Myers' O(ND) shortest edit script
//!
//! Edits carry the 0-based positions of the elements they refer to, so
//! hunks and blame can map them back to line numbers.

use derive_new::new;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<T> {
    Delete { value: T, a: usize },
    Insert { value: T, b: usize },
    Equal { value: T, a: usize, b: usize },
}

impl<T> Edit<T> {
    pub fn value(&self) -> &T {
        match self {
            Edit::Delete { value, .. } | Edit::Insert { value, .. } | Edit::Equal { value, .. } => {
                value
            }
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Edit::Equal { .. })
    }
}

pub trait DiffAlgorithm<T> {
    fn diff(&self) -> Vec<Edit<T>>;
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MyersDiff<'d, T> {
    a: &'d [T],
    b: &'d [T],
}

impl<'d, T: Eq + Clone> MyersDiff<'d, T> {
    /// Furthest-reaching x for every diagonal k, one snapshot per edit distance d
    fn compute_shortest_edit(&self) -> Vec<Vec<isize>> {
        let (n, m) = (self.a.len() as isize, self.b.len() as isize);
        let offset = (n + m) as usize;

        let mut v = vec![0; 2 * offset + 2];
        let mut trace = Vec::new();

        for d in 0..=(n + m) {
            trace.push(v.clone());

            for k in (-d..=d).step_by(2) {
                let idx = (offset as isize + k) as usize;

                let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                    // insertion, coming down from k+1
                    v[idx + 1]
                } else {
                    // deletion, coming right from k-1
                    v[idx - 1] + 1
                };

                let mut y = x - k;
                while x < n && y < m && self.a[x as usize] == self.b[y as usize] {
                    x += 1;
                    y += 1;
                }

                v[idx] = x;

                if x >= n && y >= m {
                    return trace;
                }
            }
        }

        trace
    }

    /// Moves from the end back to the origin as (prev_x, prev_y, x, y)
    fn backtrack(&self) -> Vec<(isize, isize, isize, isize)> {
        let (mut x, mut y) = (self.a.len() as isize, self.b.len() as isize);
        let offset = (x + y) as isize;
        let mut edit_path = Vec::new();

        for (d, v) in self.compute_shortest_edit().iter().enumerate().rev() {
            let d = d as isize;
            let k = x - y;

            let prev_k = if k == -d
                || (k != d && v[(offset + k - 1) as usize] < v[(offset + k + 1) as usize])
            {
                k + 1
            } else {
                k - 1
            };

            let prev_x = v[(offset + prev_k) as usize];
            let prev_y = prev_x - prev_k;

            while x > prev_x && y > prev_y {
                edit_path.push((x - 1, y - 1, x, y));
                x -= 1;
                y -= 1;
            }

            if d > 0 {
                edit_path.push((prev_x, prev_y, x, y));
            }

            (x, y) = (prev_x, prev_y);
        }

        edit_path
    }
}

impl<'d, T: Eq + Clone> DiffAlgorithm<T> for MyersDiff<'d, T> {
    fn diff(&self) -> Vec<Edit<T>> {
        if self.a.is_empty() && self.b.is_empty() {
            return Vec::new();
        }

        let mut diff = Vec::new();

        for (prev_x, prev_y, x, y) in self.backtrack() {
            let (a, b) = (prev_x as usize, prev_y as usize);

            if x == prev_x {
                diff.push(Edit::Insert {
                    value: self.b[b].clone(),
                    b,
                });
            } else if y == prev_y {
                diff.push(Edit::Delete {
                    value: self.a[a].clone(),
                    a,
                });
            } else {
                diff.push(Edit::Equal {
                    value: self.a[a].clone(),
                    a,
                    b,
                });
            }
        }

        diff.reverse();
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn string_inputs() -> (Vec<char>, Vec<char>) {
        ("abcabba".chars().collect(), "cbabac".chars().collect())
    }

    fn render(edits: &[Edit<char>]) -> String {
        edits
            .iter()
            .map(|edit| match edit {
                Edit::Delete { value, .. } => format!("-{value}"),
                Edit::Insert { value, .. } => format!("+{value}"),
                Edit::Equal { value, .. } => format!(" {value}"),
            })
            .collect()
    }

    #[rstest]
    fn shortest_script_for_the_classic_example(string_inputs: (Vec<char>, Vec<char>)) {
        let (a, b) = string_inputs;
        let edits = MyersDiff::new(&a, &b).diff();

        assert_eq!(render(&edits), "-a-b c+b a b-b a+c");
        assert_eq!(edits.iter().filter(|e| e.is_change()).count(), 5);
    }

    #[test]
    fn positions_point_back_into_inputs() {
        let a = vec!["line1", "line2", "line3", "line4"];
        let b = vec!["line2", "line3_modified", "line4", "line5"];

        for edit in MyersDiff::new(&a, &b).diff() {
            match edit {
                Edit::Delete { value, a: i } => assert_eq!(a[i], value),
                Edit::Insert { value, b: j } => assert_eq!(b[j], value),
                Edit::Equal { value, a: i, b: j } => {
                    assert_eq!(a[i], value);
                    assert_eq!(b[j], value);
                }
            }
        }
    }

    #[rstest]
    #[case(vec![], vec![], 0)]
    #[case(vec![], vec!["x"], 1)]
    #[case(vec!["x", "y"], vec![], 2)]
    #[case(vec!["x"], vec!["x"], 1)]
    fn degenerate_inputs(
        #[case] a: Vec<&str>,
        #[case] b: Vec<&str>,
        #[case] expected_edits: usize,
    ) {
        assert_eq!(MyersDiff::new(&a, &b).diff().len(), expected_edits);
    }
}
