use ahash::AHashMap;

// ============================================================================
// XBRL Instance Data Structures
// ============================================================================

/// Namespace prefix declaration (`xmlns:name="namespace_uri"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub name: String,
    pub namespace_uri: String,
}

impl Prefix {
    pub fn new(name: impl Into<String>, namespace_uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace_uri: namespace_uri.into(),
        }
    }
}

/// Taxonomy schema or linkbase reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dts {
    pub name: String,
    pub href: String,
}

impl Dts {
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub value: String,
}

impl Unit {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    pub group: String,
    pub footnote_type: String,
    pub footnote: String,
    pub language: String,
}

// Period with forever support
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Instant { instant: String },
    StartEnd { start: String, end: String },
    Forever { value: String },
}

impl Period {
    pub const FOREVER: &'static str = "forever";

    pub fn instant(instant: impl Into<String>) -> Self {
        Period::Instant {
            instant: instant.into(),
        }
    }

    pub fn start_end(start: impl Into<String>, end: impl Into<String>) -> Self {
        Period::StartEnd {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn forever() -> Self {
        Period::Forever {
            value: Self::FOREVER.to_string(),
        }
    }
}

/// Reporting entity and period. The period kind is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub id: String,
    pub entity_identifier: String,
    period: Period,
}

impl Context {
    pub fn new(id: impl Into<String>, entity_identifier: impl Into<String>, period: Period) -> Self {
        Self {
            id: id.into(),
            entity_identifier: entity_identifier.into(),
            period,
        }
    }

    pub fn period(&self) -> &Period {
        &self.period
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fact {
    pub id: Option<String>,
    pub name: String,
    pub value: Option<String>,
    pub context_ref: String,
    pub unit_ref: Option<String>,
}

impl Fact {
    pub fn new(name: impl Into<String>, context_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context_ref: context_ref.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_unit(mut self, unit_ref: impl Into<String>) -> Self {
        self.unit_ref = Some(unit_ref.into());
        self
    }

    /// Fact id, treating an empty id as absent.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Fact value, treating an empty value as absent.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|value| !value.is_empty())
    }
}

// Main instance structure. Every collection exists from construction on.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    pub prefixes: Vec<Prefix>,
    pub dts: Vec<Dts>,
    pub facts: Vec<Fact>,
    pub units: AHashMap<String, Unit>,
    pub footnotes: AHashMap<String, Footnote>,
    contexts: Vec<Context>,
    context_slots: AHashMap<String, usize>,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(facts: usize, contexts: usize, units: usize) -> Self {
        Self {
            prefixes: Vec::new(),
            dts: Vec::new(),
            facts: Vec::with_capacity(facts),
            units: AHashMap::with_capacity(units),
            footnotes: AHashMap::new(),
            contexts: Vec::with_capacity(contexts),
            context_slots: AHashMap::with_capacity(contexts),
        }
    }

    /// Inserts a context keyed by its id. A context with an id already present
    /// replaces the old one at the same enumeration position.
    pub fn insert_context(&mut self, context: Context) -> Option<Context> {
        match self.context_slots.get(&context.id) {
            Some(&slot) => Some(std::mem::replace(&mut self.contexts[slot], context)),
            None => {
                self.context_slots
                    .insert(context.id.clone(), self.contexts.len());
                self.contexts.push(context);
                None
            }
        }
    }

    pub fn context(&self, id: &str) -> Option<&Context> {
        self.context_slots.get(id).map(|&slot| &self.contexts[slot])
    }

    /// Contexts in enumeration (insertion) order.
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn insert_unit(&mut self, id: impl Into<String>, unit: Unit) -> Option<Unit> {
        self.units.insert(id.into(), unit)
    }

    /// Registers a footnote for the fact with `fact_id`, under the `#fact_id` key.
    pub fn insert_footnote(&mut self, fact_id: &str, footnote: Footnote) -> Option<Footnote> {
        self.footnotes.insert(format!("#{}", fact_id), footnote)
    }

    pub fn footnote_for(&self, fact: &Fact) -> Option<&Footnote> {
        let id = fact.id()?;
        self.footnotes.get(&format!("#{}", id))
    }

    pub fn unit_for(&self, fact: &Fact) -> Option<&Unit> {
        fact.unit_ref.as_deref().and_then(|unit_ref| self.units.get(unit_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_instance_is_empty() {
        let instance = Instance::new();
        assert!(instance.prefixes.is_empty());
        assert!(instance.dts.is_empty());
        assert!(instance.facts.is_empty());
        assert!(instance.contexts().is_empty());
        assert!(instance.units.is_empty());
        assert!(instance.footnotes.is_empty());
    }

    #[test]
    fn test_context_replacement_keeps_position() {
        let mut instance = Instance::new();
        instance.insert_context(Context::new("a", "1", Period::instant("2020-01-01")));
        instance.insert_context(Context::new("b", "2", Period::forever()));

        let old = instance.insert_context(Context::new("a", "3", Period::start_end("2020-01-01", "2020-12-31")));
        assert_eq!(old.map(|c| c.entity_identifier), Some("1".to_string()));

        let ids: Vec<_> = instance.contexts().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(instance.context("a").unwrap().entity_identifier, "3");
    }

    #[test]
    fn test_empty_fact_fields_count_as_absent() {
        let fact = Fact::new("us-gaap:Assets", "C1").with_id("").with_value("");
        assert_eq!(fact.id(), None);
        assert_eq!(fact.value(), None);
    }

    #[test]
    fn test_footnote_key_uses_hash_prefix() {
        let mut instance = Instance::new();
        instance.insert_footnote(
            "f1",
            Footnote {
                group: "g".into(),
                footnote_type: "t".into(),
                footnote: "text".into(),
                language: "en".into(),
            },
        );
        assert!(instance.footnotes.contains_key("#f1"));
        assert!(instance.footnote_for(&Fact::new("x", "C1").with_id("f1")).is_some());
        assert!(instance.footnote_for(&Fact::new("x", "C1")).is_none());
    }
}
