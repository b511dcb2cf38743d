// Mandatory namespace declarations for XBRL-JSON output
use crate::model::{Instance, Prefix};

pub const XBRLI_PREFIX: &str = "xbrli";
pub const XBRLI_NAMESPACE: &str = "http://www.xbrl.org/2003/instance";
pub const XBRL_PREFIX: &str = "xbrl";
pub const OIM_NAMESPACE: &str = "http://www.xbrl.org/CR/2017-05-02/oim";

/// Repairs the prefix sequence of `instance` in place.
///
/// `xbrli` is appended only when no entry of that name exists; an existing one
/// is left as it is. Every `xbrl` entry is dropped and the canonical OIM one is
/// appended at the end, so `xbrl` moves to the last position on every call.
/// Map interpretation is stable across calls, list order is not.
pub fn canonicalize(instance: &mut Instance) {
    let prefixes = &mut instance.prefixes;

    if !prefixes.iter().any(|p| p.name == XBRLI_PREFIX) {
        prefixes.push(Prefix::new(XBRLI_PREFIX, XBRLI_NAMESPACE));
    }

    prefixes.retain(|p| p.name != XBRL_PREFIX);
    prefixes.push(Prefix::new(XBRL_PREFIX, OIM_NAMESPACE));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named<'a>(instance: &'a Instance, name: &str) -> Vec<&'a str> {
        instance
            .prefixes
            .iter()
            .filter(|p| p.name == name)
            .map(|p| p.namespace_uri.as_str())
            .collect()
    }

    #[test]
    fn test_empty_instance_gets_both_prefixes() {
        let mut instance = Instance::new();
        canonicalize(&mut instance);
        assert_eq!(
            instance.prefixes,
            vec![
                Prefix::new(XBRLI_PREFIX, XBRLI_NAMESPACE),
                Prefix::new(XBRL_PREFIX, OIM_NAMESPACE),
            ]
        );
    }

    #[test]
    fn test_existing_xbrli_is_kept() {
        let mut instance = Instance::new();
        instance.prefixes.push(Prefix::new("xbrli", "urn:wrong"));
        canonicalize(&mut instance);
        assert_eq!(named(&instance, "xbrli"), vec!["urn:wrong"]);
    }

    #[test]
    fn test_duplicate_xbrl_entries_collapse() {
        let mut instance = Instance::new();
        instance.prefixes.push(Prefix::new("xbrl", "urn:a"));
        instance.prefixes.push(Prefix::new("us-gaap", "http://fasb.org/us-gaap/2019-01-31"));
        instance.prefixes.push(Prefix::new("xbrl", "urn:b"));
        canonicalize(&mut instance);
        assert_eq!(named(&instance, "xbrl"), vec![OIM_NAMESPACE]);
        assert_eq!(instance.prefixes.last().unwrap().name, "xbrl");
    }

    #[test]
    fn test_repeated_calls_move_xbrl_to_end() {
        let mut instance = Instance::new();
        canonicalize(&mut instance);
        instance.prefixes.push(Prefix::new("dei", "http://xbrl.sec.gov/dei/2019-01-31"));
        canonicalize(&mut instance);

        let names: Vec<_> = instance.prefixes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["xbrli", "dei", "xbrl"]);
        assert_eq!(named(&instance, "xbrli").len(), 1);
    }
}
