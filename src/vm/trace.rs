//! Execution trace of the register machine.
//!
//! Records program execution as a matrix where rows are cycles and columns are registers.

use std::fmt;

use crate::error::{Result, StarkError};
use crate::field::FieldElement;

/// Rectangular trace: every row has `width` register values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTrace {
    width: usize,
    rows: Vec<Vec<FieldElement>>,
}

impl ExecutionTrace {
    /// Builds a trace from field rows, rejecting empty or ragged input.
    pub fn new(rows: Vec<Vec<FieldElement>>) -> Result<Self> {
        let width = rows.first().ok_or(StarkError::EmptyTrace)?.len();
        if width == 0 {
            return Err(StarkError::EmptyTrace);
        }
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(StarkError::RaggedTrace {
                    row,
                    expected: width,
                    actual: values.len(),
                });
            }
        }
        Ok(Self { width, rows })
    }

    pub fn from_rows(rows: &[Vec<u64>]) -> Result<Self> {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|&v| FieldElement::from(v)).collect())
                .collect(),
        )
    }

    /// Parses whitespace-separated non-negative integers, one row per line.
    /// Blank lines are skipped.
    pub fn parse(input: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for (number, line) in input.lines().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            let row = tokens
                .into_iter()
                .map(|token| {
                    token
                        .parse::<FieldElement>()
                        .map_err(|_| StarkError::TraceParse {
                            line: number + 1,
                            token: token.to_string(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }
        Self::new(rows)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<FieldElement>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[FieldElement]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn first_row(&self) -> &[FieldElement] {
        &self.rows[0]
    }

    pub fn last_row(&self) -> &[FieldElement] {
        &self.rows[self.rows.len() - 1]
    }

    /// All values of one register, top to bottom.
    pub fn column(&self, register: usize) -> Vec<FieldElement> {
        self.rows.iter().map(|row| row[register]).collect()
    }

    pub fn set(&mut self, row: usize, register: usize, value: FieldElement) -> Result<()> {
        let height = self.rows.len();
        let width = self.width;
        let slot = self
            .rows
            .get_mut(row)
            .ok_or(StarkError::SizeMismatch {
                expected: height,
                actual: row,
            })?
            .get_mut(register)
            .ok_or(StarkError::SizeMismatch {
                expected: width,
                actual: register,
            })?;
        *slot = value;
        Ok(())
    }

    /// Appends `count` filler rows; the i-th appended row holds `(i + 1)·20` in every register.
    pub fn append_randomizers(&mut self, count: usize) {
        for i in 0..count {
            let filler = FieldElement::from(((i + 1) * 20) as u64);
            self.rows.push(vec![filler; self.width]);
        }
    }
}

impl fmt::Display for ExecutionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for value in row {
                write!(f, "{} |", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
