//! # Continuous Beam Analysis
//!
//! Multi-span beam analysis by the direct stiffness method, with code load
//! combinations and live-load patterning.
//!
//! ## Pipeline
//!
//! 1. [`build_model`] - validate input, split spans at every load discontinuity
//! 2. [`solve_load_types`] - factor the stiffness matrix once, solve each load type
//! 3. [`superpose`] - scale and combine per combination and pattern, track extremes
//!
//! ## Notation
//!
//! - N spans creates N+1 nodes (support locations)
//! - Nodes are numbered 0 to N (left to right)
//! - Spans are numbered 0 to N-1 (left to right)
//! - Positions are measured from the left end of the entire beam
//!
//! ## Example
//!
//! ```rust
//! use beam_core::calculations::continuous_beam::{analyze, AnalysisOptions, ContinuousBeamInput};
//! use beam_core::loads::{DiscreteLoad, LoadType};
//!
//! // Two-span continuous beam: 12 + 10, pinned at all supports
//! let input = ContinuousBeamInput::from_codes(&["12", "10"], &["p", "p", "p"])
//!     .unwrap()
//!     .with_label("CB-1")
//!     .with_load(DiscreteLoad::uniform(LoadType::Dead, 15.0))
//!     .with_load(DiscreteLoad::uniform(LoadType::Live, 40.0));
//!
//! let analysis = analyze(&input, &AnalysisOptions::default()).unwrap();
//! let summary = analysis.summary();
//! assert_eq!(summary.num_patterns, 3);
//! assert!(summary.envelope.m_min.value < 0.0);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{build_model, Fixity, Model};
use super::solve::{solve_load_types, LoadTypeSolution, NodeReactions};
use super::superposition::{superpose, CombernInfo, Envelope, PatternScheme, SolverState};
use crate::errors::{CalcError, CalcResult};
use crate::exact::Exact;
use crate::loads::{DiscreteLoad, ASD_SET, SERVICE_SET};

// =============================================================================
// SUPPORT INPUT
// =============================================================================

/// Support condition at a node, as entered
///
/// Accepts either a bare fixity code (`"p"`) or an object carrying a spring
/// constant (`{"code": "s", "spring_constant": 500.0}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SupportRepr")]
pub struct SupportInput {
    /// Fixity code (c, f, p, h, ph, s)
    pub code: String,

    /// Spring stiffness (force per length), required for spring supports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spring_constant: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SupportRepr {
    Code(String),
    Full {
        code: String,
        #[serde(default)]
        spring_constant: Option<f64>,
    },
}

impl From<SupportRepr> for SupportInput {
    fn from(repr: SupportRepr) -> Self {
        match repr {
            SupportRepr::Code(code) => SupportInput::new(code),
            SupportRepr::Full {
                code,
                spring_constant,
            } => SupportInput {
                code,
                spring_constant,
            },
        }
    }
}

impl SupportInput {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            spring_constant: None,
        }
    }

    /// Elastic support of stiffness `k`
    pub fn spring(k: f64) -> Self {
        Self {
            code: Fixity::Spring.code().to_string(),
            spring_constant: Some(k),
        }
    }

    /// Parsed fixity, if the code is recognized
    pub fn fixity(&self) -> Option<Fixity> {
        Fixity::from_code(&self.code)
    }
}

impl From<Fixity> for SupportInput {
    fn from(fixity: Fixity) -> Self {
        SupportInput::new(fixity.code())
    }
}

// =============================================================================
// CONTINUOUS BEAM INPUT
// =============================================================================

/// Input for continuous beam analysis
///
/// ## Node/Span Relationship
///
/// For N spans, there are N+1 nodes (support locations):
///
/// ```text
/// Node 0    Node 1    Node 2    Node 3
///   |--------|---------|---------|
///    Span 0    Span 1    Span 2
/// ```
///
/// ## Support Configuration Examples
///
/// - Simply supported: `["p", "p"]`
/// - Cantilever: `["f", "c"]`
/// - Propped cantilever: `["f", "p"]`
/// - Gerber beam: `["f", "h", "p"]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousBeamInput {
    /// User label for this beam
    #[serde(default)]
    pub label: String,

    /// Span lengths, left to right
    pub spans: Vec<Exact>,

    /// Support at each node; length must be `spans.len() + 1`
    pub supports: Vec<SupportInput>,

    /// Loads, positioned from the left end of the beam
    #[serde(default)]
    pub loads: Vec<DiscreteLoad>,

    /// Elastic modulus; omit together with `i` to skip deflections
    #[serde(default)]
    pub e: Option<f64>,

    /// Moment of inertia
    #[serde(default)]
    pub i: Option<f64>,
}

impl ContinuousBeamInput {
    /// Beam from span length texts and fixity codes, with no loads
    ///
    /// Fixity codes are checked later, by the model builder.
    pub fn from_codes(spans: &[&str], supports: &[&str]) -> CalcResult<Self> {
        let spans = spans
            .iter()
            .enumerate()
            .map(|(i, text)| {
                text.parse::<Exact>()
                    .map_err(|e| CalcError::invalid_input(format!("spans[{}]", i), *text, e.to_string()))
            })
            .collect::<CalcResult<Vec<_>>>()?;
        Ok(Self {
            label: String::new(),
            spans,
            supports: supports.iter().map(|code| SupportInput::new(*code)).collect(),
            loads: Vec::new(),
            e: None,
            i: None,
        })
    }

    /// Set the label (builder pattern)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Add a load (builder pattern)
    pub fn with_load(mut self, load: DiscreteLoad) -> Self {
        self.loads.push(load);
        self
    }

    /// Set E and I (builder pattern)
    pub fn with_section(mut self, e: f64, i: f64) -> Self {
        self.e = Some(e);
        self.i = Some(i);
        self
    }

    /// Number of spans
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Number of nodes (span_count + 1)
    pub fn node_count(&self) -> usize {
        self.spans.len() + 1
    }

    /// Total length of all spans combined
    pub fn total_length(&self) -> Exact {
        self.spans.iter().sum()
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Requested live-load patterning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternMode {
    /// Load every span at once
    None,
    /// All spans, then alternate spans
    #[default]
    Checkerboard,
    /// Every non-empty subset of spans (checkerboard beyond 7 spans)
    Full,
}

/// Analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Combination set name (`service`, `asce7-asd`, `asce7-lrfd`)
    pub combination_set: String,

    /// Live-load patterning
    pub patterning: PatternMode,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            combination_set: ASD_SET.to_string(),
            patterning: PatternMode::default(),
        }
    }
}

impl AnalysisOptions {
    /// Single unit-factor pass over the aggregate load
    pub fn service() -> Self {
        Self {
            combination_set: SERVICE_SET.to_string(),
            patterning: PatternMode::None,
        }
    }

    pub fn with_combination_set(mut self, name: impl Into<String>) -> Self {
        self.combination_set = name.into();
        self
    }

    pub fn with_patterning(mut self, patterning: PatternMode) -> Self {
        self.patterning = patterning;
        self
    }
}

/// A beam plus its analysis settings, as read from a job file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub beam: ContinuousBeamInput,
    #[serde(default)]
    pub options: AnalysisOptions,
}

impl AnalysisJob {
    /// Parse a JSON job
    ///
    /// # Example
    /// ```
    /// use beam_core::calculations::continuous_beam::AnalysisJob;
    ///
    /// let job = AnalysisJob::from_json(r#"{
    ///     "beam": {
    ///         "spans": ["4.3", 5.8],
    ///         "supports": ["p", {"code": "s", "spring_constant": 1000.0}, "p"],
    ///         "loads": [{"load_type": "Dead", "magnitude": 10.0}]
    ///     },
    ///     "options": {"patterning": "full"}
    /// }"#).unwrap();
    /// assert_eq!(job.beam.supports[1].spring_constant, Some(1000.0));
    /// assert_eq!(job.options.combination_set, "asce7-asd");
    /// ```
    pub fn from_json(text: &str) -> CalcResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn run(&self) -> CalcResult<ContinuousBeamAnalysis> {
        analyze(&self.beam, &self.options)
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Everything one analysis produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousBeamAnalysis {
    pub label: String,
    pub model: Model,
    pub solution: LoadTypeSolution,
    pub state: SolverState,
    pub envelope: Envelope,
}

/// Unfactored reactions at one support, per load slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportSummary {
    pub node: usize,
    pub x: f64,
    pub fixity: Fixity,
    pub reactions: NodeReactions,
}

/// Compact, serializable digest of an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub label: String,
    pub num_spans: usize,
    pub num_segments: usize,
    pub num_dof: usize,
    pub half_bandwidth: usize,
    pub combination_set: String,
    pub pattern_scheme: PatternScheme,
    pub num_patterns: usize,
    pub num_combinations: usize,
    pub num_comberns: usize,
    pub num_load_cases: usize,
    pub deflection_enabled: bool,
    pub supports: Vec<SupportSummary>,
    pub envelope: Envelope,
}

impl AnalysisSummary {
    /// Descriptor of the combern behind a tracked extreme
    pub fn governing(&self, combination: Option<usize>) -> Option<&CombernInfo> {
        combination.and_then(|c| self.envelope.combern(c))
    }
}

impl ContinuousBeamAnalysis {
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            label: self.label.clone(),
            num_spans: self.model.num_spans(),
            num_segments: self.model.num_segments(),
            num_dof: self.solution.dtm.num_dof,
            half_bandwidth: self.solution.dtm.half_bandwidth,
            combination_set: self.model.beam.combination_set.clone(),
            pattern_scheme: self.model.beam.pattern_scheme,
            num_patterns: self.model.beam.num_patterns,
            num_combinations: self.envelope.num_combinations,
            num_comberns: self.state.num_comberns,
            num_load_cases: self.solution.num_cases,
            deflection_enabled: self.model.beam.deflection_enabled(),
            supports: self
                .model
                .nodes
                .iter()
                .zip(&self.solution.reactions)
                .enumerate()
                .filter(|(_, (node, _))| node.fixity.has_force_reaction())
                .map(|(j, (node, reactions))| SupportSummary {
                    node: j,
                    x: node.x,
                    fixity: node.fixity,
                    reactions: *reactions,
                })
                .collect(),
            envelope: self.envelope.clone(),
        }
    }
}

// =============================================================================
// CALCULATION FUNCTION
// =============================================================================

/// Analyze a continuous beam
///
/// # Arguments
///
/// * `input` - Spans, supports, loads and section properties
/// * `options` - Combination set and patterning
///
/// # Returns
///
/// * `Ok(ContinuousBeamAnalysis)` - Model, per-type solutions, trackers and envelope
/// * `Err(CalcError)` - Invalid input, or an unstable structure
pub fn analyze(input: &ContinuousBeamInput, options: &AnalysisOptions) -> CalcResult<ContinuousBeamAnalysis> {
    let model = build_model(input, options)?;
    let solution = solve_load_types(&model)?;
    let (state, envelope) = superpose(&model, &solution)?;

    debug!(
        "analyzed '{}': M+ {:.4} / M- {:.4}, V+ {:.4} / V- {:.4}",
        input.label, envelope.m_max.value, envelope.m_min.value, envelope.v_max.value, envelope.v_min.value
    );

    Ok(ContinuousBeamAnalysis {
        label: input.label.clone(),
        model,
        solution,
        state,
        envelope,
    })
}

// =============================================================================
// TESTS
// =============================================================================
