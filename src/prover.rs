//! STARK prover for register machine traces.
//!
//! The prover walks a fixed sequence of [`ProverStage`]s: it extends the
//! trace, interpolates one polynomial per register over the trace domain,
//! divides out boundary and transition zerofiers, combines all quotients
//! with channel-drawn weights and hands the combined codeword to FRI.
//! A quotient that is not exact means the trace violates a constraint and
//! aborts the run.

use std::fmt;
use std::time::Instant;

use tracing::{debug, info, info_span, instrument, warn};

use crate::channel::{Commitment, ProofChannel};
use crate::config::StarkConfig;
use crate::error::{Result, StarkError};
use crate::field::FieldElement;
use crate::math::domain::{Domain, fri_domain_length, omicron_domain_length};
use crate::math::fri::{Fri, FriOutcome};
use crate::math::polynomial::{Polynomial, interpolate_domain, zerofier_domain};
use crate::transcript::Transcript;
use crate::vm::constraints::ConstraintSystem;
use crate::vm::trace::ExecutionTrace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProverStage {
    Ready,
    TraceExtension,
    DomainSetup,
    TracePolynomialInterpolation,
    BoundaryQuotientConstruction,
    TransitionQuotientConstruction,
    ConstraintCombination,
    FriProving,
    Done,
}

impl fmt::Display for ProverStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProverStage::Ready => "ready",
            ProverStage::TraceExtension => "trace extension",
            ProverStage::DomainSetup => "domain setup",
            ProverStage::TracePolynomialInterpolation => "trace interpolation",
            ProverStage::BoundaryQuotientConstruction => "boundary quotients",
            ProverStage::TransitionQuotientConstruction => "transition quotients",
            ProverStage::ConstraintCombination => "constraint combination",
            ProverStage::FriProving => "FRI",
            ProverStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Sizes and FRI result of a completed run.
#[derive(Debug, Clone)]
pub struct ProverOutput {
    /// Rows after randomizers were appended.
    pub trace_length: usize,
    pub omicron_domain_length: usize,
    pub fri_domain_length: usize,
    pub combined_degree: isize,
    pub fri: FriOutcome,
}

pub struct StarkProver {
    config: StarkConfig,
    deadline: Option<Instant>,
    stage: ProverStage,
}

impl StarkProver {
    pub fn new(config: StarkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            deadline: None,
            stage: ProverStage::Ready,
        })
    }

    /// Aborts with [`StarkError::DeadlineExceeded`] at the first stage or FRI
    /// round boundary reached after `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn config(&self) -> &StarkConfig {
        &self.config
    }

    /// The last stage entered.
    pub fn stage(&self) -> ProverStage {
        self.stage
    }

    fn enter(&mut self, stage: ProverStage) -> Result<()> {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(StarkError::DeadlineExceeded {
                stage: stage.to_string(),
            });
        }
        debug!(from = %self.stage, to = %stage, "prover stage");
        self.stage = stage;
        Ok(())
    }

    #[instrument(skip_all, fields(rows = trace.height(), registers = trace.width()))]
    pub fn prove<C: ProofChannel>(
        &mut self,
        trace: &ExecutionTrace,
        constraints: &ConstraintSystem,
        channel: &mut C,
    ) -> Result<ProverOutput> {
        let config = self.config;

        self.enter(ProverStage::TraceExtension)?;
        let original_length = trace.height();
        let mut trace = trace.clone();
        trace.append_randomizers(config.num_randomizers);
        let trace_length = trace.height();
        let width = trace.width();

        self.enter(ProverStage::DomainSetup)?;
        let air_degree = constraints.max_transition_degree();
        if air_degree > config.transition_constraint_degree {
            warn!(
                air_degree,
                configured = config.transition_constraint_degree,
                "configured constraint degree is below the AIR degree"
            );
        }
        let omicron_length = omicron_domain_length(trace_length, config.transition_constraint_degree);
        let fri_length = fri_domain_length(omicron_length, config.expansion_factor);
        let omicron_domain = Domain::subgroup(omicron_length)?;
        let fri_domain = Domain::coset(fri_length)?;
        let omicron = omicron_domain.generator;
        let trace_domain = omicron_domain.take(trace_length);
        let fri_points = fri_domain.elements();
        info!(
            original_length,
            trace_length, omicron_length, fri_length, "domains ready"
        );

        self.enter(ProverStage::TracePolynomialInterpolation)?;
        let trace_polynomials = info_span!("interpolate trace").in_scope(|| {
            (0..width)
                .map(|register| interpolate_domain(&trace_domain, &trace.column(register)))
                .collect::<Result<Vec<_>>>()
        })?;

        self.enter(ProverStage::BoundaryQuotientConstruction)?;
        let boundary_quotients = info_span!("boundary quotients").in_scope(|| {
            trace_polynomials
                .iter()
                .enumerate()
                .map(|(register, polynomial)| {
                    boundary_quotient(register, polynomial, constraints, omicron)
                })
                .collect::<Result<Vec<_>>>()
        })?;
        let boundary_codewords: Vec<Vec<FieldElement>> = boundary_quotients
            .iter()
            .map(|q| q.evaluate_domain(&fri_points))
            .collect();
        channel.commit(Commitment::BoundaryQuotients(&boundary_codewords))?;

        self.enter(ProverStage::TransitionQuotientConstruction)?;
        let transition_quotients = info_span!("transition quotients").in_scope(|| {
            let mut arguments = Vec::with_capacity(1 + 2 * width);
            arguments.push(Polynomial::x());
            arguments.extend(trace_polynomials.iter().cloned());
            arguments.extend(trace_polynomials.iter().map(|p| p.scale(omicron)));

            let exempt = config.num_randomizers + 1;
            let constrained = trace_length.saturating_sub(exempt);
            let zerofier = zerofier_domain(&trace_domain[..constrained]);

            constraints
                .transition_constraints
                .iter()
                .map(|constraint| {
                    let realized = constraint.polynomial.evaluate_symbolic(&arguments)?;
                    let quotient = realized.exact_div(&zerofier).map_err(|e| match e {
                        StarkError::NonZeroRemainder => StarkError::UnsatisfiedTransition {
                            constraint: constraint.name.clone(),
                        },
                        other => other,
                    })?;
                    debug!(
                        constraint = %constraint.name,
                        degree = quotient.degree(),
                        "transition quotient"
                    );
                    Ok(quotient)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        self.enter(ProverStage::ConstraintCombination)?;
        let weights = channel.challenges(transition_quotients.len() + boundary_quotients.len());
        let combined = transition_quotients
            .iter()
            .chain(&boundary_quotients)
            .zip(&weights)
            .fold(Polynomial::zero(), |acc, (q, &w)| &acc + &q.mul_scalar(w));
        let combined_degree = combined.degree();
        info!(combined_degree, "constraints combined");

        self.enter(ProverStage::FriProving)?;
        let codeword = combined.evaluate_domain(&fri_points);
        let fri = Fri::new(config.expansion_factor, config.num_colinearity_checks)
            .with_deadline(self.deadline)
            .prove(codeword, fri_domain, channel)?;

        self.enter(ProverStage::Done)?;
        Ok(ProverOutput {
            trace_length,
            omicron_domain_length: omicron_length,
            fri_domain_length: fri_length,
            combined_degree,
            fri,
        })
    }
}

/// `(T - I) / Z` over the points pinned for `register`; zero when nothing is pinned.
fn boundary_quotient(
    register: usize,
    polynomial: &Polynomial,
    constraints: &ConstraintSystem,
    omicron: FieldElement,
) -> Result<Polynomial> {
    let (domain, values): (Vec<_>, Vec<_>) = constraints
        .boundary_constraints
        .iter()
        .filter(|c| c.register == register)
        .map(|c| (omicron.pow(c.cycle as u128), c.value))
        .unzip();
    if domain.is_empty() {
        return Ok(Polynomial::zero());
    }

    let interpolant = interpolate_domain(&domain, &values)?;
    (polynomial - &interpolant)
        .exact_div(&zerofier_domain(&domain))
        .map_err(|e| match e {
            StarkError::NonZeroRemainder => StarkError::UnsatisfiedBoundary { register },
            other => other,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
}

/// Outcome of [`witness`]: the full transcript text and its verdict.
#[derive(Debug, Clone)]
pub struct WitnessReport {
    pub transcript: String,
    pub verdict: Verdict,
    /// The soundness error that ended the run early, if any.
    pub error: Option<StarkError>,
}

impl WitnessReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}

/// Proves that `trace` is a valid run of the register machine.
///
/// Builds the machine constraints with boundary constraints taken from the
/// first and last rows, runs the prover against a fresh [`Transcript`] and
/// finalizes it. A trace that violates a constraint yields a complete
/// transcript with verdict [`Verdict::Failed`]; other errors are returned.
pub fn witness(trace: &ExecutionTrace, config: &StarkConfig) -> Result<WitnessReport> {
    let constraints = ConstraintSystem::for_trace(trace)?;
    let mut prover = StarkProver::new(*config)?;
    let mut transcript = Transcript::new();

    let error = match prover.prove(trace, &constraints, &mut transcript) {
        Ok(output) => {
            debug!(rounds = output.fri.rounds, "proof complete");
            None
        }
        Err(e) if e.is_soundness_failure() => {
            warn!(error = %e, stage = %prover.stage(), "trace does not satisfy constraints");
            transcript.abort(&e);
            Some(e)
        }
        Err(e) => return Err(e),
    };

    let verdict = if transcript.finish() {
        Verdict::Passed
    } else {
        Verdict::Failed
    };
    Ok(WitnessReport {
        transcript: transcript.into_text(),
        verdict,
        error,
    })
}
