//! Text forms of the three benchmark families.
//!
//! The loaders work on in-memory text; reading files is the caller's
//! business. Each returns a validated [`Problem`].
//!
//! - DIMACS `.col`: `p edge n m` then `e u v` lines (1-indexed)
//! - Knapsack: `n W` then `n` lines of `value weight`
//! - Solomon: rows of `id x y demand ready due service` (whitespace or
//!   comma separated); header lines are skipped and ids are renumbered
//!   from 0 in row order, so the depot must be the first data row

use super::types::{Customer, Problem, ProblemError};
use thiserror::Error;

/// Errors raised by the text loaders.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("missing header line")]
    MissingHeader,
    #[error("line {line}: cannot parse '{content}'")]
    BadLine { line: usize, content: String },
    #[error("expected {expected} records, found {found}")]
    CountMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

fn bad_line(line: usize, content: &str) -> ParseError {
    ParseError::BadLine {
        line: line + 1,
        content: content.trim().to_string(),
    }
}

fn parse_fields<T: std::str::FromStr>(
    line_no: usize,
    line: &str,
    tokens: &[&str],
) -> Result<Vec<T>, ParseError> {
    tokens
        .iter()
        .map(|t| t.parse::<T>().map_err(|_| bad_line(line_no, line)))
        .collect()
}

/// Parses a DIMACS edge-format graph. Edges are normalized to 0-indexed.
pub fn parse_dimacs(instance_id: &str, text: &str) -> Result<Problem, ParseError> {
    let mut header: Option<(usize, usize)> = None;
    let mut edges = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.first() {
            None | Some(&"c") => continue,
            Some(&"p") => {
                if tokens.len() < 4 {
                    return Err(bad_line(line_no, line));
                }
                let nums: Vec<usize> = parse_fields(line_no, line, &tokens[2..4])?;
                header = Some((nums[0], nums[1]));
            }
            Some(&"e") => {
                if tokens.len() < 3 {
                    return Err(bad_line(line_no, line));
                }
                let nums: Vec<usize> = parse_fields(line_no, line, &tokens[1..3])?;
                if nums[0] == 0 || nums[1] == 0 {
                    return Err(bad_line(line_no, line));
                }
                edges.push((nums[0] - 1, nums[1] - 1));
            }
            Some(_) => return Err(bad_line(line_no, line)),
        }
    }

    let (n, m) = header.ok_or(ParseError::MissingHeader)?;
    if edges.len() != m {
        // Some generators count each undirected edge twice.
        if edges.len() != 2 * m {
            return Err(ParseError::CountMismatch {
                expected: m,
                found: edges.len(),
            });
        }
    }
    Ok(Problem::graph_coloring(instance_id, n, &edges)?)
}

/// Parses a knapsack instance (`n W` header, then `value weight` rows).
pub fn parse_kbp(instance_id: &str, text: &str) -> Result<Problem, ParseError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (line_no, header) = lines.next().ok_or(ParseError::MissingHeader)?;
    let tokens: Vec<&str> = header.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(bad_line(line_no, header));
    }
    let nums: Vec<u64> = parse_fields(line_no, header, &tokens[..2])?;
    let (n, capacity) = (nums[0] as usize, nums[1]);

    let mut items = Vec::with_capacity(n);
    for (line_no, line) in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            return Err(bad_line(line_no, line));
        }
        let nums: Vec<u64> = parse_fields(line_no, line, &tokens[..2])?;
        items.push((nums[0], nums[1]));
    }
    if items.len() != n {
        return Err(ParseError::CountMismatch {
            expected: n,
            found: items.len(),
        });
    }
    Ok(Problem::knapsack(instance_id, capacity, &items)?)
}

/// Parses Solomon-style customer rows. `capacity` is supplied separately.
pub fn parse_solomon(instance_id: &str, text: &str, capacity: u64) -> Result<Problem, ParseError> {
    let mut customers = Vec::new();

    for line in text.lines() {
        let tokens: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() != 7 {
            continue;
        }
        let Ok(nums) = tokens
            .iter()
            .map(|t| t.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
        else {
            continue;
        };
        if nums[3] < 0.0 || nums[3].fract() != 0.0 {
            continue;
        }
        customers.push(Customer {
            id: customers.len(),
            x: nums[1],
            y: nums[2],
            demand: nums[3] as u64,
            ready_time: nums[4],
            due_date: nums[5],
            service_time: nums[6],
        });
    }

    if customers.is_empty() {
        return Err(ParseError::MissingHeader);
    }
    Ok(Problem::vrptw(instance_id, capacity, customers)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ProblemFamily;

    #[test]
    fn test_dimacs_triangle() {
        let text = "c triangle\np edge 3 3\ne 1 2\ne 2 3\ne 1 3\n";
        let p = parse_dimacs("tri", text).unwrap();
        assert_eq!(p.family(), ProblemFamily::GraphColoring);
        let g = p.graph().unwrap();
        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.edges(), &[(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_dimacs_errors() {
        assert_eq!(parse_dimacs("x", "e 1 2\n"), Err(ParseError::MissingHeader));
        assert!(matches!(
            parse_dimacs("x", "p edge 2 1\ne 0 1\n"),
            Err(ParseError::BadLine { line: 2, .. })
        ));
        assert_eq!(
            parse_dimacs("x", "p edge 3 3\ne 1 2\n"),
            Err(ParseError::CountMismatch {
                expected: 3,
                found: 1
            })
        );
    }

    #[test]
    fn test_kbp() {
        let text = "4 10\n6 4\n4 3\n5 5\n3 2\n";
        let p = parse_kbp("k4", text).unwrap();
        let k = p.knapsack_data().unwrap();
        assert_eq!(k.capacity, 10);
        assert_eq!(k.items.len(), 4);
        assert_eq!(k.items[2].value, 5);
    }

    #[test]
    fn test_kbp_count_mismatch() {
        assert!(matches!(
            parse_kbp("k", "3 10\n1 1\n"),
            Err(ParseError::CountMismatch { .. })
        ));
    }

    #[test]
    fn test_solomon_skips_headers_and_renumbers() {
        let text = "C101\nVEHICLE\nCUST NO. XCOORD. YCOORD. DEMAND READY DUE SERVICE\n\
                    1, 40, 50, 0, 0, 1236, 0\n\
                    2, 45, 68, 10, 912, 967, 90\n\
                    3, 45, 70, 30, 825, 870, 90\n";
        let p = parse_solomon("c101", text, 200).unwrap();
        let r = p.routing().unwrap();
        assert_eq!(r.customers.len(), 3);
        assert_eq!(r.depot().id, 0);
        assert_eq!(r.customers[2].demand, 30);
        assert_eq!(r.capacity, 200);
    }
}
