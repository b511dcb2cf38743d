// Per-fact join of contexts, units and footnotes
use crate::model::{Context, Fact, Footnote, Instance, Period};
use ahash::AHashMap;
use log::trace;
use serde::Serialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One element of the OIM `fact` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactFragment<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a str>,
    pub aspect: Aspect<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footnote: Option<FootnoteFragment<'a>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aspect<'a> {
    #[serde(rename = "xbrl:concept")]
    pub concept: &'a str,
    #[serde(rename = "xbrl:entity", skip_serializing_if = "Option::is_none")]
    pub entity: Option<&'a str>,
    #[serde(flatten)]
    pub period: Option<PeriodAspect<'a>>,
    #[serde(rename = "xbrl:unit", skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'a str>,
}

/// Time dimension of an aspect; exactly one shape per matched context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PeriodAspect<'a> {
    Instant {
        #[serde(rename = "xbrl:periodInstant")]
        instant: &'a str,
    },
    StartEnd {
        #[serde(rename = "xbrl:periodStart")]
        start: &'a str,
        #[serde(rename = "xbrl:periodEnd")]
        end: &'a str,
    },
    Forever {
        #[serde(rename = "xbrl:periodForever")]
        value: &'a str,
    },
}

impl<'a> From<&'a Period> for PeriodAspect<'a> {
    fn from(period: &'a Period) -> Self {
        match period {
            Period::Instant { instant } => PeriodAspect::Instant { instant },
            Period::StartEnd { start, end } => PeriodAspect::StartEnd { start, end },
            Period::Forever { value } => PeriodAspect::Forever { value },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootnoteFragment<'a> {
    pub group: &'a str,
    #[serde(rename = "footnoteType")]
    pub footnote_type: &'a str,
    pub footnote: &'a str,
    pub language: &'a str,
}

impl<'a> From<&'a Footnote> for FootnoteFragment<'a> {
    fn from(footnote: &'a Footnote) -> Self {
        Self {
            group: &footnote.group,
            footnote_type: &footnote.footnote_type,
            footnote: &footnote.footnote,
            language: &footnote.language,
        }
    }
}

/// Resolves facts against the contexts, units and footnotes of one instance.
///
/// Context matching is loose: the first context, in enumeration order, whose
/// id contains the fact's `context_ref` case-insensitively wins. Composite ids
/// such as `FY2019_C1_Segment` therefore match a `C1` reference, and so do
/// `C10` or `AC1`. Every distinct reference is matched once up front, which
/// leaves [`FactResolver::resolve`] lock-free and order-independent.
pub struct FactResolver<'a> {
    instance: &'a Instance,
    lowered_ids: Vec<String>,
    matches: AHashMap<&'a str, Option<usize>>,
}

impl<'a> FactResolver<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        let lowered_ids = instance
            .contexts()
            .iter()
            .map(|c| c.id.to_lowercase())
            .collect();

        let mut resolver = Self {
            instance,
            lowered_ids,
            matches: AHashMap::new(),
        };

        for fact in &instance.facts {
            let context_ref = fact.context_ref.as_str();
            if !resolver.matches.contains_key(context_ref) {
                let slot = resolver.scan(context_ref);
                resolver.matches.insert(context_ref, slot);
            }
        }

        resolver
    }

    fn scan(&self, context_ref: &str) -> Option<usize> {
        let needle = context_ref.to_lowercase();
        self.lowered_ids.iter().position(|id| id.contains(&needle))
    }

    pub fn find_context(&self, context_ref: &str) -> Option<&'a Context> {
        let slot = match self.matches.get(context_ref) {
            Some(slot) => *slot,
            None => self.scan(context_ref),
        };
        slot.map(|slot| &self.instance.contexts()[slot])
    }

    pub fn resolve(&self, fact: &'a Fact) -> FactFragment<'a> {
        let context = self.find_context(&fact.context_ref);
        if context.is_none() {
            trace!("fact {:?}: no context matches {:?}", fact.name, fact.context_ref);
        }

        let unit = self.instance.unit_for(fact);
        if unit.is_none() {
            if let Some(unit_ref) = &fact.unit_ref {
                trace!("fact {:?}: unit {:?} not found", fact.name, unit_ref);
            }
        }

        FactFragment {
            id: fact.id(),
            value: fact.value(),
            aspect: Aspect {
                concept: &fact.name,
                entity: context.map(|c| c.entity_identifier.as_str()),
                period: context.map(|c| PeriodAspect::from(c.period())),
                unit: unit.map(|u| u.value.as_str()),
            },
            footnote: self.instance.footnote_for(fact).map(FootnoteFragment::from),
        }
    }

    /// Resolves every fact of the instance, in fact-sequence order.
    pub fn resolve_all(&self, parallel: bool) -> Vec<FactFragment<'a>> {
        if parallel {
            self.resolve_parallel()
        } else {
            self.resolve_sequential()
        }
    }

    fn resolve_sequential(&self) -> Vec<FactFragment<'a>> {
        self.instance
            .facts
            .iter()
            .map(|fact| self.resolve(fact))
            .collect()
    }

    // Indexed collect keeps fact-sequence order
    #[cfg(feature = "parallel")]
    fn resolve_parallel(&self) -> Vec<FactFragment<'a>> {
        self.instance
            .facts
            .par_iter()
            .map(|fact| self.resolve(fact))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn resolve_parallel(&self) -> Vec<FactFragment<'a>> {
        self.resolve_sequential()
    }
}

/// Resolves a single fact without reusing a prepared resolver.
pub fn resolve_fact<'a>(fact: &'a Fact, instance: &'a Instance) -> FactFragment<'a> {
    FactResolver::new(instance).resolve(fact)
}
