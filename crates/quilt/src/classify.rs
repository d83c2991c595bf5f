//! Concept classification: structural headers versus data rows.
//!
//! Taxonomy schemas attached to a filing are often only partially parsed, so
//! the authoritative `abstract` attribute frequently defaults to false.
//! [`ConceptClassifier`] compensates with tiered heuristics over the concept
//! name and presentation structure.

use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::trace;

/// Structural name suffixes that denote headers rather than facts.
///
/// Note the deliberate absence of `TextBlock`: a bare `...TextBlock` suffix
/// denotes content-bearing disclosure text and must classify as data. Only
/// `...TextBlockAbstract` is structural, and it already matches via the
/// `Abstract` suffix.
const STRUCTURAL_SUFFIXES: [&str; 6] = [
    "Abstract",
    "RollForward",
    "Table",
    "Axis",
    "Domain",
    "LineItems",
];

/// Curated concept names known to be structural headers, covering
/// roll-forwards, statement tables, and DEI section headers that schemas in
/// the wild commonly leave unmarked.
const KNOWN_ABSTRACT_CONCEPTS: [&str; 12] = [
    "us-gaap_StatementOfFinancialPositionAbstract",
    "us-gaap_IncomeStatementAbstract",
    "us-gaap_StatementOfCashFlowsAbstract",
    "us-gaap_StatementOfStockholdersEquityAbstract",
    "us-gaap_StatementOfIncomeAndComprehensiveIncomeAbstract",
    "us-gaap_StatementTable",
    "us-gaap_StatementLineItems",
    "us-gaap_IncreaseDecreaseInStockholdersEquityRollForward",
    "us-gaap_IncreaseDecreaseInTemporaryEquityRollForward",
    "dei_CoverAbstract",
    "dei_DocumentInformationTable",
    "dei_EntityInformationLineItems",
];

/// Decides whether a concept name denotes a structural ("abstract") header.
///
/// The classifier's configuration is immutable; extension methods return a
/// new instance rather than mutating shared state, so a long-lived service
/// can hand customized classifiers to individual requests without
/// bleed-through.
///
/// # Examples
///
/// ```
/// use quilt::ConceptClassifier;
///
/// let classifier = ConceptClassifier::default();
/// assert!(classifier.is_abstract("us-gaap_AssetsAbstract", false, false, false));
/// assert!(!classifier.is_abstract("us-gaap_Assets", false, false, true));
/// ```
#[derive(Debug, Clone)]
pub struct ConceptClassifier {
    known_abstract: HashSet<String>,
    structural_suffixes: Vec<String>,
}

impl Default for ConceptClassifier {
    fn default() -> Self {
        Self {
            known_abstract: KNOWN_ABSTRACT_CONCEPTS
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
            structural_suffixes: STRUCTURAL_SUFFIXES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ConceptClassifier {
    /// Create a classifier with the default known-concept set and suffixes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a classifier that additionally treats the given concept names
    /// as abstract. Additive only; there is no removal.
    #[must_use]
    pub fn with_known_concepts<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_abstract
            .extend(concepts.into_iter().map(|c| normalize(&c.into())));
        self
    }

    /// Return a classifier that additionally treats the given name suffixes
    /// as structural. Additive only.
    #[must_use]
    pub fn with_structural_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.structural_suffixes
            .extend(suffixes.into_iter().map(Into::into));
        self
    }

    /// Decide whether `concept_name` is a structural header.
    ///
    /// Rules apply in strict order, first match wins:
    /// 1. the schema says so;
    /// 2. the name is in the curated known-abstract set;
    /// 3. the name carries a structural suffix;
    /// 4. the concept has presentation children but no fact values anywhere;
    /// 5. otherwise, fall back to the schema flag (false by default).
    ///
    /// Total and deterministic for any input string, including empty names.
    pub fn is_abstract(
        &self,
        concept_name: &str,
        schema_abstract: bool,
        has_children: bool,
        has_values: bool,
    ) -> bool {
        if schema_abstract {
            return true;
        }

        let normalized = normalize(concept_name);
        if self.known_abstract.contains(&normalized) {
            trace!(concept = concept_name, "classified abstract via known set");
            return true;
        }

        if self
            .structural_suffixes
            .iter()
            .any(|suffix| normalized.ends_with(suffix.as_str()))
        {
            trace!(concept = concept_name, "classified abstract via suffix");
            return true;
        }

        if has_children && !has_values {
            trace!(
                concept = concept_name,
                "classified abstract via structure: children but no values"
            );
            return true;
        }

        schema_abstract
    }
}

/// Concept ids appear with either `:` or `_` separating the taxonomy prefix.
fn normalize(concept: &str) -> String {
    concept.replace(':', "_")
}

/// Classify a concept name with the default classifier.
///
/// Convenience for callers that need the abstract/data distinction without
/// configuring a [`ConceptClassifier`] of their own.
pub fn is_abstract_concept(
    concept_name: &str,
    schema_abstract: bool,
    has_children: bool,
    has_values: bool,
) -> bool {
    static DEFAULT: OnceLock<ConceptClassifier> = OnceLock::new();
    DEFAULT
        .get_or_init(ConceptClassifier::default)
        .is_abstract(concept_name, schema_abstract, has_children, has_values)
}
