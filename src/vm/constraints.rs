//! Constraint system for STARK proofs.
//!
//! Defines the algebraic constraints of the register machine: transition
//! constraints between consecutive rows, stated as multivariate polynomials,
//! and boundary constraints pinning the first and last rows.
//!
//! Variable layout of every transition polynomial: `x_0` is the cycle,
//! `x_1..=x_12` the current row and `x_13..=x_24` the next row, each row in
//! [`Register`] order.

use crate::error::{Result, StarkError};
use crate::field::FieldElement;
use crate::math::multivariate::MultivariatePolynomial;
use crate::math::polynomial::Polynomial;
use crate::vm::trace::ExecutionTrace;

/// Number of general purpose registers `R0..R4`.
pub const GENERAL_REGISTERS: usize = 5;

/// Trace columns, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    Opcode,
    Rd,
    Sr1,
    ImmFlag,
    Imm,
    Pc,
    Mem,
}

impl Register {
    pub const COUNT: usize = 12;

    pub const ALL: [Register; Register::COUNT] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::Opcode,
        Register::Rd,
        Register::Sr1,
        Register::ImmFlag,
        Register::Imm,
        Register::Pc,
        Register::Mem,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop,
    Add,
    Ld,
    St,
    Halt,
}

impl Opcode {
    pub const COUNT: usize = 5;

    pub fn value(self) -> u64 {
        self as u64
    }
}

/// One row's register variables.
#[derive(Debug, Clone)]
pub struct RegisterVariables {
    pub general: [MultivariatePolynomial; GENERAL_REGISTERS],
    pub opcode: MultivariatePolynomial,
    pub rd: MultivariatePolynomial,
    pub sr1: MultivariatePolynomial,
    pub imm_flag: MultivariatePolynomial,
    pub imm: MultivariatePolynomial,
    pub pc: MultivariatePolynomial,
    pub mem: MultivariatePolynomial,
    first_variable: usize,
}

impl RegisterVariables {
    fn starting_at(first_variable: usize) -> Self {
        let var = |r: Register| MultivariatePolynomial::variable(first_variable + r.index());
        Self {
            general: [
                var(Register::R0),
                var(Register::R1),
                var(Register::R2),
                var(Register::R3),
                var(Register::R4),
            ],
            opcode: var(Register::Opcode),
            rd: var(Register::Rd),
            sr1: var(Register::Sr1),
            imm_flag: var(Register::ImmFlag),
            imm: var(Register::Imm),
            pc: var(Register::Pc),
            mem: var(Register::Mem),
            first_variable,
        }
    }

    /// Variable index of `register` in this row.
    pub fn variable_index(&self, register: Register) -> usize {
        self.first_variable + register.index()
    }

    /// `selector(register)` lifted onto this row's copy of `register`.
    fn select(&self, selector: &Polynomial, register: Register) -> MultivariatePolynomial {
        MultivariatePolynomial::lift(selector, self.variable_index(register))
    }
}

/// The cycle variable plus the current and next row.
#[derive(Debug, Clone)]
pub struct TransitionVariables {
    pub cycle: MultivariatePolynomial,
    pub current: RegisterVariables,
    pub next: RegisterVariables,
}

impl TransitionVariables {
    pub const COUNT: usize = 1 + 2 * Register::COUNT;

    pub fn new() -> Self {
        Self {
            cycle: MultivariatePolynomial::variable(0),
            current: RegisterVariables::starting_at(1),
            next: RegisterVariables::starting_at(1 + Register::COUNT),
        }
    }
}

impl Default for TransitionVariables {
    fn default() -> Self {
        Self::new()
    }
}

/// Univariate polynomial that is 1 at `k` and 0 at every other point of `space`.
pub fn lagrange_selector(k: u64, space: &[u64]) -> Result<Polynomial> {
    if !space.contains(&k) {
        return Err(StarkError::InvalidConfig(format!(
            "selector point {} is not in its space",
            k
        )));
    }

    let k = FieldElement::from(k);
    let mut numerator = Polynomial::constant(FieldElement::ONE);
    let mut denominator = FieldElement::ONE;
    for point in space.iter().map(|&p| FieldElement::from(p)) {
        if point == k {
            continue;
        }
        numerator = &numerator * &Polynomial::new(vec![-point, FieldElement::ONE]);
        denominator *= k - point;
    }
    numerator.div_scalar(denominator)
}

/// Constraint between consecutive execution trace rows.
#[derive(Debug, Clone)]
pub struct TransitionConstraint {
    /// Constraint name for debugging
    pub name: String,
    pub polynomial: MultivariatePolynomial,
}

/// The register-`register` polynomial must equal `value` at `cycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryConstraint {
    pub cycle: usize,
    pub register: usize,
    pub value: FieldElement,
}

/// System holding all program constraints.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSystem {
    pub transition_constraints: Vec<TransitionConstraint>,
    pub boundary_constraints: Vec<BoundaryConstraint>,
}

impl ConstraintSystem {
    /// Adds transition constraint to system.
    pub fn add_transition_constraint(&mut self, name: &str, polynomial: MultivariatePolynomial) {
        self.transition_constraints.push(TransitionConstraint {
            name: name.to_string(),
            polynomial,
        });
    }

    /// Adds boundary constraint to system.
    pub fn add_boundary_constraint(&mut self, cycle: usize, register: usize, value: FieldElement) {
        self.boundary_constraints.push(BoundaryConstraint {
            cycle,
            register,
            value,
        });
    }

    /// Transition constraints of the machine: ADD, LD and ST semantics, each
    /// split on the immediate flag.
    pub fn machine() -> Result<Self> {
        let vars = TransitionVariables::new();
        let (cur, next) = (&vars.current, &vars.next);

        let reg_space: Vec<u64> = (0..GENERAL_REGISTERS as u64).collect();
        let op_space: Vec<u64> = (0..Opcode::COUNT as u64).collect();
        let reg_selectors = reg_space
            .iter()
            .map(|&i| lagrange_selector(i, &reg_space))
            .collect::<Result<Vec<_>>>()?;
        let op_selector = |op: Opcode| -> Result<MultivariatePolynomial> {
            Ok(cur.select(&lagrange_selector(op.value(), &op_space)?, Register::Opcode))
        };

        // sum_i [operand == i] * row.R_i
        let indexed = |operand: Register, row: &RegisterVariables| {
            reg_selectors
                .iter()
                .zip(&row.general)
                .fold(MultivariatePolynomial::zero(), |acc, (sel, r)| {
                    &acc + &(&cur.select(sel, operand) * r)
                })
        };
        let dst_next = indexed(Register::Rd, next);
        let src_rd = indexed(Register::Rd, cur);
        let src1 = indexed(Register::Sr1, cur);
        let src2 = indexed(Register::Imm, cur);

        let one = MultivariatePolynomial::one();
        let imm_flag = &cur.imm_flag;
        let reg_flag = &one - imm_flag;

        let sel_add = op_selector(Opcode::Add)?;
        let sel_ld = op_selector(Opcode::Ld)?;
        let sel_st = op_selector(Opcode::St)?;

        let mut system = Self::default();
        system.add_transition_constraint(
            "add-imm",
            &(&sel_add * imm_flag) * &(&(&dst_next - &src1) - &cur.imm),
        );
        system.add_transition_constraint(
            "add-reg",
            &(&sel_add * &reg_flag) * &(&(&dst_next - &src1) - &src2),
        );
        system.add_transition_constraint("ld-imm", &(&sel_ld * imm_flag) * &(&dst_next - &cur.imm));
        system.add_transition_constraint("ld-mem", &(&sel_ld * &reg_flag) * &(&dst_next - &cur.mem));
        system.add_transition_constraint("st-imm", &(&sel_st * imm_flag) * &(&next.mem - &cur.imm));
        system.add_transition_constraint("st-reg", &(&sel_st * &reg_flag) * &(&next.mem - &src_rd));
        Ok(system)
    }

    /// Machine constraints plus boundary constraints pinning every register in
    /// the first and last row of `trace`.
    pub fn for_trace(trace: &ExecutionTrace) -> Result<Self> {
        if trace.width() != Register::COUNT {
            return Err(StarkError::SizeMismatch {
                expected: Register::COUNT,
                actual: trace.width(),
            });
        }
        let mut system = Self::machine()?;
        system.boundary_constraints = boundary_constraints(trace);
        Ok(system)
    }

    pub fn max_transition_degree(&self) -> usize {
        self.transition_constraints
            .iter()
            .map(|c| c.polynomial.total_degree())
            .max()
            .unwrap_or(0)
    }

    /// Evaluates every transition constraint on each pair of consecutive rows,
    /// then every boundary constraint. All zeros means the trace is valid.
    pub fn evaluate(&self, trace: &ExecutionTrace) -> Result<Vec<FieldElement>> {
        let mut evaluations = Vec::new();

        for (cycle, pair) in trace.rows().windows(2).enumerate() {
            let mut point = Vec::with_capacity(1 + 2 * trace.width());
            point.push(FieldElement::from(cycle));
            point.extend_from_slice(&pair[0]);
            point.extend_from_slice(&pair[1]);
            for constraint in &self.transition_constraints {
                evaluations.push(constraint.polynomial.evaluate(&point)?);
            }
        }

        for constraint in &self.boundary_constraints {
            let value = trace
                .row(constraint.cycle)
                .and_then(|row| row.get(constraint.register))
                .ok_or(StarkError::SizeMismatch {
                    expected: trace.height(),
                    actual: constraint.cycle,
                })?;
            evaluations.push(*value - constraint.value);
        }

        Ok(evaluations)
    }

    /// Checks if all constraints are satisfied.
    pub fn is_satisfied(&self, trace: &ExecutionTrace) -> Result<bool> {
        Ok(self.evaluate(trace)?.iter().all(FieldElement::is_zero))
    }
}

/// `(0, r, first[r])` and `(last, r, last[r])` for every register `r`.
/// A single-row trace pins each register once.
pub fn boundary_constraints(trace: &ExecutionTrace) -> Vec<BoundaryConstraint> {
    let last = trace.height() - 1;
    let first_row = trace.first_row().iter().enumerate().map(|(register, &value)| {
        BoundaryConstraint {
            cycle: 0,
            register,
            value,
        }
    });
    let last_row = trace.last_row().iter().enumerate().map(|(register, &value)| {
        BoundaryConstraint {
            cycle: last,
            register,
            value,
        }
    });
    if last == 0 {
        return first_row.collect();
    }
    first_row.chain(last_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_trace() -> ExecutionTrace {
        ExecutionTrace::from_rows(&[
            vec![0, 0, 0, 0, 0, 1, 0, 0, 1, 10, 0, 0],
            vec![10, 0, 0, 0, 0, 3, 0, 0, 0, 0, 1, 0],
            vec![10, 0, 0, 0, 0, 2, 1, 0, 0, 0, 2, 10],
            vec![10, 10, 0, 0, 0, 1, 0, 1, 0, 0, 3, 10],
            vec![20, 10, 0, 0, 0, 0, 0, 0, 0, 0, 4, 10],
            vec![20, 10, 0, 0, 0, 0, 0, 0, 0, 0, 5, 10],
        ])
        .unwrap()
    }

    #[test]
    fn test_lagrange_selector() {
        let space = [0, 1, 2, 3, 4];
        for k in space {
            let sel = lagrange_selector(k, &space).unwrap();
            assert_eq!(sel.degree(), 4);
            for p in space {
                let expected = if p == k { FieldElement::ONE } else { FieldElement::ZERO };
                assert_eq!(sel.evaluate(FieldElement::from(p)), expected);
            }
        }
        assert!(lagrange_selector(7, &space).is_err());
    }

    #[test]
    fn test_variable_layout() {
        let vars = TransitionVariables::new();
        assert_eq!(vars.current.variable_index(Register::R0), 1);
        assert_eq!(vars.current.variable_index(Register::Mem), 12);
        assert_eq!(vars.next.variable_index(Register::R0), 13);
        assert_eq!(vars.next.variable_index(Register::Mem), TransitionVariables::COUNT - 1);
    }

    #[test]
    fn test_machine_constraints() {
        let system = ConstraintSystem::machine().unwrap();
        assert_eq!(system.transition_constraints.len(), 6);
        assert_eq!(system.max_transition_degree(), 10);
        for constraint in &system.transition_constraints {
            assert!(constraint.polynomial.arity() <= TransitionVariables::COUNT);
        }
    }

    #[test]
    fn test_program_trace_is_satisfied() {
        let trace = program_trace();
        let system = ConstraintSystem::for_trace(&trace).unwrap();
        assert_eq!(system.boundary_constraints.len(), 24);
        assert!(system.is_satisfied(&trace).unwrap());
    }

    #[test]
    fn test_unsatisfied_constraint() {
        let trace = program_trace();
        let system = ConstraintSystem::for_trace(&trace).unwrap();

        // LD at row 2 loads MEM = 10 into R1; claim it loaded 11
        let mut corrupted = trace.clone();
        corrupted.set(3, Register::R1.index(), FieldElement::from(11u64)).unwrap();
        assert!(!system.is_satisfied(&corrupted).unwrap());
    }

    #[test]
    fn test_boundary_constraint() {
        let trace = program_trace();
        let constraints = boundary_constraints(&trace);
        assert_eq!(constraints[0], BoundaryConstraint {
            cycle: 0,
            register: 0,
            value: FieldElement::ZERO,
        });
        assert_eq!(constraints[12 + Register::Pc.index()], BoundaryConstraint {
            cycle: 5,
            register: Register::Pc.index(),
            value: FieldElement::from(5u64),
        });

        let mut system = ConstraintSystem::default();
        system.add_boundary_constraint(0, Register::Imm.index(), FieldElement::from(9u64));
        assert!(!system.is_satisfied(&trace).unwrap());
    }

    #[test]
    fn test_single_row_boundary() {
        let trace = ExecutionTrace::from_rows(&[vec![3; Register::COUNT]]).unwrap();
        let system = ConstraintSystem::for_trace(&trace).unwrap();
        assert_eq!(system.boundary_constraints.len(), Register::COUNT);
        assert!(system.boundary_constraints.iter().all(|c| c.cycle == 0));
        assert!(system.is_satisfied(&trace).unwrap());
    }

    #[test]
    fn test_trace_width_must_match_registers() {
        let rows: Vec<Vec<u64>> = program_trace()
            .rows()
            .iter()
            .map(|row| {
                let mut wide: Vec<u64> = row.iter().map(|v| v.value() as u64).collect();
                wide.push(0);
                wide
            })
            .collect();
        let wide = ExecutionTrace::from_rows(&rows).unwrap();
        assert_eq!(
            ConstraintSystem::for_trace(&wide).unwrap_err(),
            StarkError::SizeMismatch {
                expected: Register::COUNT,
                actual: Register::COUNT + 1,
            }
        );
    }
}
