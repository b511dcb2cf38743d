// XBRL-JSON (OIM) document emission
use crate::guard::ensure_well_formed;
use crate::model::{Dts, Instance, Prefix};
use crate::prefix;
use crate::resolver::{FactFragment, FactResolver};
use crate::{EmitConfig, Result};
use log::debug;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::time::Instant;

pub const DOCUMENT_TYPE: &str = "http://www.xbrl.org/CR/2017-05-02/xbrl-json";
pub const PRELOAD_MESSAGE: &str = "wait a moment, still loading facts...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// `{"report": {documentType, prefix, dts, fact}}`
    Report,
    /// Report with a single placeholder in place of the facts
    Preload,
    /// Flat prefix object
    Prefixes,
    /// Flat taxonomy reference object
    Dts,
    /// Bare fact array
    Facts,
}

impl EmitMode {
    /// Modes that write the prefix section repair it first.
    pub fn canonicalizes(self) -> bool {
        match self {
            EmitMode::Report | EmitMode::Preload | EmitMode::Prefixes => true,
            EmitMode::Dts | EmitMode::Facts => false,
        }
    }
}

// Sections keep sequence order and write duplicate names as stored.
struct PrefixSection<'a>(&'a [Prefix]);

impl Serialize for PrefixSection<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for prefix in self.0 {
            map.serialize_entry(&prefix.name, &prefix.namespace_uri)?;
        }
        map.end()
    }
}

struct DtsSection<'a>(&'a [Dts]);

impl Serialize for DtsSection<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for dts in self.0 {
            map.serialize_entry(&dts.name, &dts.href)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct Placeholder {
    msg: &'static str,
}

#[derive(Serialize)]
#[serde(untagged)]
enum FactSection<'a> {
    Loaded(Vec<FactFragment<'a>>),
    Loading([Placeholder; 1]),
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(rename = "documentType")]
    document_type: &'static str,
    prefix: PrefixSection<'a>,
    dts: DtsSection<'a>,
    fact: FactSection<'a>,
}

#[derive(Serialize)]
struct ReportRoot<'a> {
    report: Report<'a>,
}

pub struct Emitter {
    config: EmitConfig,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            config: EmitConfig::default(),
        }
    }

    pub fn with_config(config: EmitConfig) -> Self {
        Self { config }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.config.pretty = pretty;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Canonicalizes prefixes when `mode` writes them, then renders.
    pub fn emit(&self, instance: &mut Instance, mode: EmitMode) -> Result<String> {
        if mode.canonicalizes() {
            prefix::canonicalize(instance);
        }
        self.render(instance, mode)
    }

    /// Renders `mode` without touching the instance. Prefixes are written as
    /// they are; callers that skip [`Emitter::emit`] canonicalize themselves.
    pub fn render(&self, instance: &Instance, mode: EmitMode) -> Result<String> {
        let start = Instant::now();

        let json = match mode {
            EmitMode::Report => self.serialize(&ReportRoot {
                report: self.report_body(instance, self.fact_section(instance)),
            })?,
            EmitMode::Preload => self.serialize(&ReportRoot {
                report: self.report_body(
                    instance,
                    FactSection::Loading([Placeholder {
                        msg: PRELOAD_MESSAGE,
                    }]),
                ),
            })?,
            EmitMode::Prefixes => self.serialize(&PrefixSection(&instance.prefixes))?,
            EmitMode::Dts => self.serialize(&DtsSection(&instance.dts))?,
            EmitMode::Facts => self.serialize(&self.fact_section(instance))?,
        };

        debug!(
            "{:?}: {} facts, {} bytes in {:.3}ms",
            mode,
            instance.facts.len(),
            json.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        ensure_well_formed(json)
    }

    pub fn report(&self, instance: &mut Instance) -> Result<String> {
        self.emit(instance, EmitMode::Report)
    }

    pub fn preload(&self, instance: &mut Instance) -> Result<String> {
        self.emit(instance, EmitMode::Preload)
    }

    pub fn prefixes(&self, instance: &mut Instance) -> Result<String> {
        self.emit(instance, EmitMode::Prefixes)
    }

    pub fn dts(&self, instance: &Instance) -> Result<String> {
        self.render(instance, EmitMode::Dts)
    }

    pub fn facts(&self, instance: &Instance) -> Result<String> {
        self.render(instance, EmitMode::Facts)
    }

    fn report_body<'a>(&self, instance: &'a Instance, fact: FactSection<'a>) -> Report<'a> {
        Report {
            document_type: DOCUMENT_TYPE,
            prefix: PrefixSection(&instance.prefixes),
            dts: DtsSection(&instance.dts),
            fact,
        }
    }

    fn fact_section<'a>(&self, instance: &'a Instance) -> FactSection<'a> {
        let resolver = FactResolver::new(instance);
        FactSection::Loaded(resolver.resolve_all(self.config.parallel))
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.config.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}
