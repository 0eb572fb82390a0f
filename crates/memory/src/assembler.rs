//! Context assembly: renders the state layers into a structured prompt.
//!
//! Sections, in fixed order (empty sections are omitted):
//!
//! 1. **Identity**: name, authority, department, organization
//! 2. **Active Constraints**: valid constraint facts, oldest first
//! 3. **Current Facts**: valid, non-constraint, not flagged for review
//! 4. **Invalidated**: facts that must be recalculated
//! 5. **Recent Corrections**: shown only for 1–3 significant corrections
//! 6. **Superseded Facts**: bare list of superseded keys
//! 7. **Recent Context**: the working set, scope-tagged
//! 8. **Environment**: freshest entries first
//! 9. **Known Unknowns**: open questions, most recent first
//!
//! Sections are joined by a blank line. There is no global token budget:
//! per-section caps are the only bound.
//!
//! # Determinism
//!
//! Identical layer state always produces identical output. Sorting is
//! stable and no time-dependent logic is used during assembly.

use serde::{Deserialize, Serialize};
use statebench_core::state::IdentityRole;

use crate::environment::Environment;
use crate::fact_store::{Correction, Fact, FactStore};
use crate::working_set::{KnownUnknowns, WorkingSet};

// ── Types ─────────────────────────────────────────────────────────────────

/// Per-section caps.
#[derive(Debug, Clone)]
struct SectionLimits {
    /// Corrections section is shown only when the significant count is in
    /// `1..=max_corrections`.
    max_corrections: usize,
    /// Corrections with a new value this short (in chars) are trivial.
    min_correction_len: usize,
    correction_new_chars: usize,
    correction_old_chars: usize,
    environment_entries: usize,
}

impl Default for SectionLimits {
    fn default() -> Self {
        Self {
            max_corrections: 3,
            min_correction_len: 10,
            correction_new_chars: 60,
            correction_old_chars: 40,
            environment_entries: 5,
        }
    }
}

/// All inputs required by the assembler for a single query.
pub struct AssemblyInput<'a> {
    pub identity: Option<&'a IdentityRole>,
    pub facts: &'a FactStore,
    pub working_set: &'a WorkingSet,
    pub environment: &'a Environment,
    pub known_unknowns: &'a KnownUnknowns,
}

/// The assembled context plus per-section statistics.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub text: String,
    pub sections: Vec<SectionStats>,
}

impl AssembledContext {
    pub fn section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// Statistics for a single rendered section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionStats {
    pub name: String,
    /// Items rendered after caps.
    pub items_included: usize,
    /// Items available before caps.
    pub items_total: usize,
}

struct Section {
    name: &'static str,
    header: &'static str,
    lines: Vec<String>,
    items_total: usize,
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// The context assembler. Stateless; create one and reuse it.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    limits: SectionLimits,
}

impl ContextAssembler {
    pub fn assemble(&self, input: &AssemblyInput<'_>) -> AssembledContext {
        let valid = input.facts.valid_facts();

        let sections: Vec<Section> = [
            input.identity.map(Self::identity_section),
            Self::constraints_section(&valid),
            Self::current_facts_section(&valid),
            Self::invalidated_section(&valid),
            self.corrections_section(input.facts.corrections()),
            Self::superseded_section(input.facts),
            Self::working_set_section(input.working_set),
            self.environment_section(input.environment),
            Self::known_unknowns_section(input.known_unknowns),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.lines.is_empty())
        .collect();

        let text = sections
            .iter()
            .map(|s| format!("## {}\n{}", s.header, s.lines.join("\n")))
            .collect::<Vec<_>>()
            .join("\n\n");

        let stats = sections
            .iter()
            .map(|s| SectionStats {
                name: s.name.to_string(),
                items_included: s.lines.len(),
                items_total: s.items_total,
            })
            .collect();

        AssembledContext {
            text,
            sections: stats,
        }
    }

    // ── Private section renderers ─────────────────────────────────────────

    fn identity_section(identity: &IdentityRole) -> Section {
        let mut lines = vec![
            format!("User: {}", identity.user_name),
            format!("Role: {}", identity.authority),
        ];
        if let Some(department) = identity.department.as_deref().filter(|d| !d.is_empty()) {
            lines.push(format!("Department: {department}"));
        }
        if let Some(organization) = identity.organization.as_deref().filter(|o| !o.is_empty()) {
            lines.push(format!("Organization: {organization}"));
        }
        Section {
            name: "identity",
            header: "Identity",
            items_total: 1,
            lines,
        }
    }

    fn constraints_section(valid: &[&Fact]) -> Option<Section> {
        let mut constraints: Vec<&Fact> =
            valid.iter().copied().filter(|f| f.is_constraint).collect();
        constraints.sort_by_key(|f| f.ts);
        let lines: Vec<String> = constraints
            .iter()
            .map(|c| {
                let label = c.constraint_type.map_or("CONSTRAINT", |t| t.as_str());
                format!("[{label}] {}", c.value)
            })
            .collect();
        Some(Section {
            name: "constraints",
            header: "Active Constraints (CHECK ALL)",
            items_total: lines.len(),
            lines,
        })
    }

    fn needs_recalculation(fact: &Fact) -> bool {
        fact.needs_review || fact.is_marked_invalidated()
    }

    fn current_facts_section(valid: &[&Fact]) -> Option<Section> {
        let mut current: Vec<&Fact> = valid
            .iter()
            .copied()
            .filter(|f| !f.is_constraint && !Self::needs_recalculation(f))
            .collect();
        current.sort_by_key(|f| f.ts);
        let lines: Vec<String> = current
            .iter()
            .map(|f| format!("- [{}] {}", f.memory_type.label(), f.value))
            .collect();
        Some(Section {
            name: "current_facts",
            header: "Current Facts",
            items_total: lines.len(),
            lines,
        })
    }

    fn invalidated_section(valid: &[&Fact]) -> Option<Section> {
        let mut flagged: Vec<&Fact> = valid
            .iter()
            .copied()
            .filter(|f| !f.is_constraint && Self::needs_recalculation(f))
            .collect();
        flagged.sort_by_key(|f| f.ts);
        let lines: Vec<String> = flagged.iter().map(|f| format!("[X] {}", f.value)).collect();
        Some(Section {
            name: "invalidated",
            header: "INVALIDATED - Must Recalculate",
            items_total: lines.len(),
            lines,
        })
    }

    fn is_significant(&self, correction: &Correction) -> bool {
        !correction.new_value.contains("INVALIDATED")
            && !correction.old_value.contains("INVALIDATED")
            && correction.new_value.chars().count() > self.limits.min_correction_len
            && correction.old_value != correction.new_value
    }

    fn corrections_section(&self, corrections: &[Correction]) -> Option<Section> {
        let significant: Vec<&Correction> =
            corrections.iter().filter(|c| self.is_significant(c)).collect();
        if significant.is_empty() || significant.len() > self.limits.max_corrections {
            return None;
        }

        let start = significant.len().saturating_sub(self.limits.max_corrections);
        let lines = significant[start..]
            .iter()
            .map(|c| {
                format!(
                    "- {}\n   (was: {})",
                    truncate_chars(&c.new_value, self.limits.correction_new_chars),
                    truncate_chars(&c.old_value, self.limits.correction_old_chars),
                )
            })
            .collect();
        Some(Section {
            name: "corrections",
            header: "Recent Corrections",
            items_total: significant.len(),
            lines,
        })
    }

    fn superseded_section(facts: &FactStore) -> Option<Section> {
        let lines: Vec<String> = facts
            .superseded_keys()
            .iter()
            .map(|key| format!("- {key}: superseded"))
            .collect();
        Some(Section {
            name: "superseded",
            header: "Superseded Facts",
            items_total: lines.len(),
            lines,
        })
    }

    fn working_set_section(working_set: &WorkingSet) -> Option<Section> {
        let lines: Vec<String> = working_set
            .iter()
            .map(|item| match item.tag() {
                Some(tag) => format!("{tag} {}", item.content),
                None => item.content.clone(),
            })
            .collect();
        Some(Section {
            name: "working_set",
            header: "Recent Context",
            items_total: lines.len(),
            lines,
        })
    }

    fn environment_section(&self, environment: &Environment) -> Option<Section> {
        let lines: Vec<String> = environment
            .freshest(self.limits.environment_entries)
            .iter()
            .map(|e| format!("- {}: {}", e.key, e.value))
            .collect();
        Some(Section {
            name: "environment",
            header: "Environment",
            items_total: environment.len(),
            lines,
        })
    }

    fn known_unknowns_section(known_unknowns: &KnownUnknowns) -> Option<Section> {
        let lines: Vec<String> = known_unknowns
            .most_recent_first()
            .into_iter()
            .map(|text| format!("- {text}"))
            .collect();
        Some(Section {
            name: "known_unknowns",
            header: "Known Unknowns",
            items_total: lines.len(),
            lines,
        })
    }
}

/// Keep the first `max` chars, appending `...` when anything was cut.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
