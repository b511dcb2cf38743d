// Streaming XBRL-XML to Instance builder
use crate::model::*;
use crate::source::XbrlFile;
use crate::{Error, Result};
use ahash::AHashMap;
use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

pub struct InstanceBuilder {
    strict: bool,
}

impl Default for InstanceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// In strict mode a context without a period fails the build instead of
    /// being skipped.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(&self, file: &XbrlFile) -> Result<Instance> {
        let instance = self.build_str(file.content())?;
        debug!(
            "{}: {} facts, {} contexts, {} units, {} footnotes",
            file.file_name(),
            instance.facts.len(),
            instance.contexts().len(),
            instance.units.len(),
            instance.footnotes.len()
        );
        Ok(instance)
    }

    pub fn build_str(&self, xml: &str) -> Result<Instance> {
        let mut reader = Reader::from_str(xml);
        let mut state = BuildState::new(self.strict);

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) => state.open(&e, false)?,
                Event::Empty(e) => state.open(&e, true)?,
                Event::End(_) => state.close()?,
                Event::Text(t) => state.text.push_str(&t.unescape().map_err(xml_error)?),
                Event::CData(c) => state.text.push_str(&String::from_utf8_lossy(&c.into_inner())),
                Event::Eof => break,
                _ => {}
            }
        }

        if !state.seen_root {
            return Err(Error::InvalidDocument("document has no root element".to_string()));
        }

        if let Some(open) = state.stack.last() {
            return Err(Error::Parse(format!(
                "unexpected end of document inside <{}>",
                open
            )));
        }

        Ok(state.instance)
    }
}

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::Parse(e.to_string())
}

type Attributes = Vec<(String, String)>;

fn read_attributes(e: &BytesStart) -> Result<Attributes> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn find<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| !key.starts_with("xmlns") && local_part(key) == name)
        .map(|(_, value)| value.as_str())
}

fn owned(attrs: &Attributes, name: &str) -> String {
    find(attrs, name).unwrap_or_default().to_string()
}

#[derive(Default)]
struct ContextDraft {
    id: String,
    identifier: String,
    instant: Option<String>,
    start: Option<String>,
    end: Option<String>,
    forever: bool,
}

impl ContextDraft {
    fn period(&mut self) -> Option<Period> {
        if let Some(instant) = self.instant.take() {
            return Some(Period::instant(instant));
        }
        match (self.start.take(), self.end.take()) {
            (Some(start), Some(end)) => Some(Period::start_end(start, end)),
            _ if self.forever => Some(Period::forever()),
            _ => None,
        }
    }
}

#[derive(Default)]
struct UnitDraft {
    id: String,
    measures: Vec<String>,
    numerator: Vec<String>,
    denominator: Vec<String>,
}

impl UnitDraft {
    fn value(&self) -> String {
        if self.numerator.is_empty() && self.denominator.is_empty() {
            self.measures.join("*")
        } else {
            format!("{}/{}", self.numerator.join("*"), self.denominator.join("*"))
        }
    }
}

struct FootnoteResource {
    label: String,
    role: String,
    language: String,
}

#[derive(Default)]
struct FootnoteLinkDraft {
    role: String,
    // label -> href
    locators: AHashMap<String, String>,
    resources: AHashMap<String, Footnote>,
    arcs: Vec<(String, String)>,
    current: Option<FootnoteResource>,
}

struct FactDraft {
    depth: usize,
    fact: Fact,
}

struct BuildState {
    strict: bool,
    instance: Instance,
    seen_root: bool,
    stack: Vec<String>,
    text: String,
    context: Option<ContextDraft>,
    unit: Option<UnitDraft>,
    footnote_link: Option<FootnoteLinkDraft>,
    fact: Option<FactDraft>,
}

impl BuildState {
    fn new(strict: bool) -> Self {
        Self {
            strict,
            instance: Instance::new(),
            seen_root: false,
            stack: Vec::new(),
            text: String::new(),
            context: None,
            unit: None,
            footnote_link: None,
            fact: None,
        }
    }

    // Fact values and footnote resources keep text across nested markup
    fn capturing(&self) -> bool {
        self.fact.is_some()
            || self
                .footnote_link
                .as_ref()
                .is_some_and(|link| link.current.is_some())
    }

    fn open(&mut self, e: &BytesStart, empty: bool) -> Result<()> {
        let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let local = local_part(&qname).to_string();

        if !self.seen_root {
            self.open_root(e, &qname)?;
        } else if !self.capturing() {
            self.text.clear();
            self.open_child(e, &qname, &local)?;
        }

        self.stack.push(local);
        if empty {
            self.close()?;
        }
        Ok(())
    }

    fn open_root(&mut self, e: &BytesStart, qname: &str) -> Result<()> {
        if !qname.to_lowercase().contains("xbrl") {
            return Err(Error::InvalidDocument(format!(
                "root element <{}> is not an XBRL instance",
                qname
            )));
        }
        self.seen_root = true;

        for (key, value) in read_attributes(e)? {
            if let Some(name) = key.strip_prefix("xmlns:") {
                self.instance.prefixes.push(Prefix::new(name, value));
            }
        }
        Ok(())
    }

    fn open_child(&mut self, e: &BytesStart, qname: &str, local: &str) -> Result<()> {
        let attrs = read_attributes(e)?;

        if let Some(link) = self.footnote_link.as_mut() {
            match local {
                "loc" => {
                    link.locators.insert(owned(&attrs, "label"), owned(&attrs, "href"));
                }
                "footnoteArc" => {
                    link.arcs.push((owned(&attrs, "from"), owned(&attrs, "to")));
                }
                "footnote" => {
                    link.current = Some(FootnoteResource {
                        label: owned(&attrs, "label"),
                        role: owned(&attrs, "role"),
                        language: owned(&attrs, "lang"),
                    });
                }
                _ => {}
            }
            return Ok(());
        }

        if let Some(context) = self.context.as_mut() {
            if local == "forever" {
                context.forever = true;
            }
            return Ok(());
        }

        if self.unit.is_some() {
            return Ok(());
        }

        match local {
            "schemaRef" | "linkbaseRef" => {
                if let Some(href) = find(&attrs, "href") {
                    let name = href.rsplit('/').next().unwrap_or(href);
                    self.instance.dts.push(Dts::new(name, href));
                }
            }
            "context" => {
                self.context = Some(ContextDraft {
                    id: owned(&attrs, "id"),
                    ..Default::default()
                });
            }
            "unit" => {
                self.unit = Some(UnitDraft {
                    id: owned(&attrs, "id"),
                    ..Default::default()
                });
            }
            "footnoteLink" => {
                self.footnote_link = Some(FootnoteLinkDraft {
                    role: owned(&attrs, "role"),
                    ..Default::default()
                });
            }
            _ => {
                if let Some(context_ref) = find(&attrs, "contextRef") {
                    self.fact = Some(FactDraft {
                        depth: self.stack.len(),
                        fact: Fact {
                            id: find(&attrs, "id").map(str::to_string),
                            name: qname.to_string(),
                            value: None,
                            context_ref: context_ref.to_string(),
                            unit_ref: find(&attrs, "unitRef").map(str::to_string),
                        },
                    });
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let local = self.stack.pop().unwrap_or_default();
        let text = self.text.trim().to_string();

        if let Some(draft) = self.fact.as_ref() {
            if draft.depth == self.stack.len() {
                if let Some(mut draft) = self.fact.take() {
                    draft.fact.value = Some(text);
                    self.instance.facts.push(draft.fact);
                }
                self.text.clear();
            }
            return Ok(());
        }

        if let Some(link) = self.footnote_link.as_mut() {
            match local.as_str() {
                "footnote" => {
                    if let Some(resource) = link.current.take() {
                        link.resources.insert(
                            resource.label,
                            Footnote {
                                group: link.role.clone(),
                                footnote_type: resource.role,
                                footnote: text,
                                language: resource.language,
                            },
                        );
                    }
                    self.text.clear();
                }
                "footnoteLink" => {
                    if let Some(link) = self.footnote_link.take() {
                        self.finish_footnote_link(link);
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        if let Some(context) = self.context.as_mut() {
            match local.as_str() {
                "identifier" => context.identifier = text,
                "instant" => context.instant = Some(text),
                "startDate" => context.start = Some(text),
                "endDate" => context.end = Some(text),
                "context" => {
                    if let Some(draft) = self.context.take() {
                        self.finish_context(draft)?;
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        if let Some(unit) = self.unit.as_mut() {
            match local.as_str() {
                "measure" => {
                    if self.stack.iter().any(|name| name == "unitNumerator") {
                        unit.numerator.push(text);
                    } else if self.stack.iter().any(|name| name == "unitDenominator") {
                        unit.denominator.push(text);
                    } else {
                        unit.measures.push(text);
                    }
                }
                "unit" => {
                    if let Some(draft) = self.unit.take() {
                        let value = draft.value();
                        self.instance.insert_unit(draft.id, Unit::new(value));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn finish_context(&mut self, mut draft: ContextDraft) -> Result<()> {
        match draft.period() {
            Some(period) => {
                self.instance
                    .insert_context(Context::new(draft.id, draft.identifier, period));
                Ok(())
            }
            None if self.strict => Err(Error::Parse(format!(
                "context {} has no period",
                draft.id
            ))),
            None => {
                warn!("skipping context {}: no period", draft.id);
                Ok(())
            }
        }
    }

    fn finish_footnote_link(&mut self, link: FootnoteLinkDraft) {
        for (from, to) in &link.arcs {
            let (Some(href), Some(footnote)) = (link.locators.get(from), link.resources.get(to)) else {
                warn!("dangling footnote arc {} -> {}", from, to);
                continue;
            };
            // Facts are addressed by their `#id` fragment
            let key = href.rfind('#').map_or(href.as_str(), |at| &href[at..]);
            self.instance
                .footnotes
                .insert(key.to_string(), footnote.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:link="http://www.xbrl.org/2003/linkbase"
            xmlns:xlink="http://www.w3.org/1999/xlink"
            xmlns:us-gaap="http://fasb.org/us-gaap/2019-01-31"
            xmlns:iso4217="http://www.xbrl.org/2003/iso4217">
  <link:schemaRef xlink:type="simple" xlink:href="http://example.com/abc-20191231.xsd"/>
  <xbrli:context id="C1">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0001234</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period><xbrli:instant>2019-12-31</xbrli:instant></xbrli:period>
  </xbrli:context>
  <xbrli:context id="D2019">
    <xbrli:entity><xbrli:identifier scheme="http://www.sec.gov/CIK">0001234</xbrli:identifier></xbrli:entity>
    <xbrli:period>
      <xbrli:startDate>2019-01-01</xbrli:startDate>
      <xbrli:endDate>2019-12-31</xbrli:endDate>
    </xbrli:period>
  </xbrli:context>
  <xbrli:context id="Always">
    <xbrli:entity><xbrli:identifier scheme="http://www.sec.gov/CIK">0001234</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:forever/></xbrli:period>
  </xbrli:context>
  <xbrli:unit id="U1"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
  <xbrli:unit id="EPS">
    <xbrli:divide>
      <xbrli:unitNumerator><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unitNumerator>
      <xbrli:unitDenominator><xbrli:measure>xbrli:shares</xbrli:measure></xbrli:unitDenominator>
    </xbrli:divide>
  </xbrli:unit>
  <us-gaap:Assets id="f1" contextRef="C1" unitRef="U1" decimals="-3">1000</us-gaap:Assets>
  <us-gaap:Revenues contextRef="D2019" unitRef="U1" decimals="0"> 250 </us-gaap:Revenues>
  <us-gaap:Policy contextRef="Always">Policy &amp; notes</us-gaap:Policy>
  <link:footnoteLink xlink:type="extended" xlink:role="http://www.xbrl.org/2003/role/link">
    <link:loc xlink:type="locator" xlink:href="#f1" xlink:label="fact_f1"/>
    <link:footnote xlink:type="resource" xlink:label="fn1" xlink:role="http://www.xbrl.org/2003/role/footnote" xml:lang="en-US">Includes <b>restricted</b> cash</link:footnote>
    <link:footnoteArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/fact-footnote" xlink:from="fact_f1" xlink:to="fn1"/>
  </link:footnoteLink>
</xbrli:xbrl>"##;

    #[test]
    fn test_builds_prefixes_and_dts() {
        let instance = InstanceBuilder::new().build_str(SAMPLE).unwrap();
        let names: Vec<_> = instance.prefixes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["xbrli", "link", "xlink", "us-gaap", "iso4217"]);
        assert_eq!(
            instance.dts,
            vec![Dts::new("abc-20191231.xsd", "http://example.com/abc-20191231.xsd")]
        );
    }

    #[test]
    fn test_builds_all_period_kinds() {
        let instance = InstanceBuilder::new().build_str(SAMPLE).unwrap();
        assert_eq!(instance.contexts().len(), 3);
        assert_eq!(instance.context("C1").unwrap().period(), &Period::instant("2019-12-31"));
        assert_eq!(
            instance.context("D2019").unwrap().period(),
            &Period::start_end("2019-01-01", "2019-12-31")
        );
        assert_eq!(instance.context("Always").unwrap().period(), &Period::forever());
        assert_eq!(instance.context("C1").unwrap().entity_identifier, "0001234");
    }

    #[test]
    fn test_builds_units() {
        let instance = InstanceBuilder::new().build_str(SAMPLE).unwrap();
        assert_eq!(instance.units["U1"].value, "iso4217:USD");
        assert_eq!(instance.units["EPS"].value, "iso4217:USD/xbrli:shares");
    }

    #[test]
    fn test_builds_facts_in_document_order() {
        let instance = InstanceBuilder::new().build_str(SAMPLE).unwrap();
        assert_eq!(instance.facts.len(), 3);

        let assets = &instance.facts[0];
        assert_eq!(assets.id(), Some("f1"));
        assert_eq!(assets.name, "us-gaap:Assets");
        assert_eq!(assets.value(), Some("1000"));
        assert_eq!(assets.unit_ref.as_deref(), Some("U1"));

        assert_eq!(instance.facts[1].value(), Some("250"));
        assert_eq!(instance.facts[1].id(), None);
        assert_eq!(instance.facts[2].value(), Some("Policy & notes"));
        assert_eq!(instance.facts[2].unit_ref, None);
    }

    #[test]
    fn test_builds_footnotes() {
        let instance = InstanceBuilder::new().build_str(SAMPLE).unwrap();
        let footnote = &instance.footnotes["#f1"];
        assert_eq!(footnote.group, "http://www.xbrl.org/2003/role/link");
        assert_eq!(footnote.footnote_type, "http://www.xbrl.org/2003/role/footnote");
        assert_eq!(footnote.footnote, "Includes restricted cash");
        assert_eq!(footnote.language, "en-US");
    }

    #[test]
    fn test_rejects_non_xbrl_root() {
        let result = InstanceBuilder::new().build_str("<html><body/></html>");
        assert!(matches!(result, Err(Error::InvalidDocument(_))));
        let result = InstanceBuilder::new().build_str("");
        assert!(matches!(result, Err(Error::InvalidDocument(_))));
    }

    #[test]
    fn test_truncated_document_is_rejected() {
        let inside_fact = r#"<xbrl><context id="C1"><entity><identifier>1</identifier></entity><period><instant>2019-12-31</instant></period></context><us-gaap:Assets contextRef="C1">100"#;
        let result = InstanceBuilder::new().build_str(inside_fact);
        assert!(matches!(result, Err(Error::Parse(msg)) if msg.contains("Assets")));

        let inside_context = r#"<xbrl><context id="C1"><entity><identifier>1</identifier>"#;
        let result = InstanceBuilder::new().build_str(inside_context);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let result = InstanceBuilder::new().build_str(r#"<xbrl><context id="C1"></unit></xbrl>"#);
        assert!(matches!(result, Err(Error::Parse(_))));

        let result = InstanceBuilder::new().build_str(r#"<xbrl><fact contextRef=C1>1</fact></xbrl>"#);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_context_without_period() {
        let xml = r#"<xbrl><context id="X"><entity><identifier>1</identifier></entity></context></xbrl>"#;
        let instance = InstanceBuilder::new().build_str(xml).unwrap();
        assert!(instance.contexts().is_empty());

        let result = InstanceBuilder::new().with_strict(true).build_str(xml);
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
