//! Plain-text input readers: whitespace-separated weight matrices, node
//! coordinate files and measured frequency vectors.

use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{path}:{line}: cannot parse {token:?} as a number")]
    BadNumber {
        path: String,
        line: usize,
        token: String,
    },
    #[error("{path}: row {row} has {got} values, expected {expected}")]
    RaggedMatrix {
        path: String,
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("{path}: expected {expected} values, found {got}")]
    WrongCount {
        path: String,
        expected: usize,
        got: usize,
    },
    #[error("{path}: file holds no values")]
    Empty { path: String },
}

fn read_to_string(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_number(path: &Path, line: usize, token: &str) -> Result<f64, ParseError> {
    token.parse::<f64>().map_err(|_| ParseError::BadNumber {
        path: path.display().to_string(),
        line,
        token: token.to_string(),
    })
}

/// Tokens are separated by whitespace or commas, one or more values per line.
fn read_values(path: &Path) -> Result<Vec<f64>, ParseError> {
    let content = read_to_string(path)?;
    let mut values = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        for token in line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            values.push(parse_number(path, line_idx + 1, token)?);
        }
    }
    Ok(values)
}

/// Reads a square weight matrix, one row per non-blank line.
pub fn read_weight_matrix(path: &Path) -> Result<Vec<Vec<f64>>, ParseError> {
    let content = read_to_string(path)?;
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        let row: Vec<f64> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|token| parse_number(path, line_idx + 1, token))
            .collect::<Result<_, _>>()?;
        if !row.is_empty() {
            rows.push(row);
        }
    }
    if rows.is_empty() {
        return Err(ParseError::Empty {
            path: path.display().to_string(),
        });
    }
    let expected = rows.len();
    for (row_idx, row) in rows.iter().enumerate() {
        if row.len() != expected {
            return Err(ParseError::RaggedMatrix {
                path: path.display().to_string(),
                row: row_idx,
                expected,
                got: row.len(),
            });
        }
    }
    Ok(rows)
}

/// Reads `2n` values laid out as all x coordinates followed by all y
/// coordinates, and pairs them up per node.
pub fn read_coordinates(
    path: &Path,
    expected_nodes: usize,
) -> Result<Vec<(f64, f64)>, ParseError> {
    let values = read_values(path)?;
    if values.len() != 2 * expected_nodes {
        return Err(ParseError::WrongCount {
            path: path.display().to_string(),
            expected: 2 * expected_nodes,
            got: values.len(),
        });
    }
    let (xs, ys) = values.split_at(expected_nodes);
    Ok(xs.iter().copied().zip(ys.iter().copied()).collect())
}

/// Reads a measured relative-frequency vector, one value per node.
pub fn read_frequencies(path: &Path, expected_nodes: usize) -> Result<Vec<f64>, ParseError> {
    let values = read_values(path)?;
    if values.len() != expected_nodes {
        return Err(ParseError::WrongCount {
            path: path.display().to_string(),
            expected: expected_nodes,
            got: values.len(),
        });
    }
    Ok(values)
}
