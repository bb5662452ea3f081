use crate::ace::{Ace, SPECIAL_PRINCIPALS};
use crate::error::{AclError, Result};

/// Outcome of classifying an ACE list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to do: either no inheritance is set at all, or all special
    /// principals already carry inheritance.
    Unchanged,
    /// The ACL needs conversion; carries the synthesized ACEs to append.
    Converted(Vec<Ace>),
}

/// Classify an ACE list and synthesize the inheritable special-principal
/// entries when a conversion is needed.
///
/// Rules are evaluated in order, first applicable rule wins:
/// 1. no ACE sets inheritance: nothing to propagate, `Unchanged`;
/// 2. all three special principals already have an inheritance-flagged ACE:
///    already migrated, `Unchanged`; one or two of them: the ACL is in an
///    ambiguous intermediate state and is rejected;
/// 3. a special principal with more than one non-inherited allow ACE or more
///    than one non-inherited deny ACE has no single canonical rule to clone
///    and is rejected;
/// 4. every allow ACE with a special principal is cloned with `fdi` prepended
///    to its flags, in original order.
///
/// Step 4 does not re-check inheritance flags on the source ACEs: step 2 has
/// already established that no special principal carries one.
pub fn classify_and_convert(aces: &[Ace]) -> Result<Decision> {
    if !aces.iter().any(Ace::has_inheritance_flag) {
        return Ok(Decision::Unchanged);
    }

    let covered = SPECIAL_PRINCIPALS
        .iter()
        .filter(|principal| {
            aces.iter()
                .any(|ace| ace.has_inheritance_flag() && ace.principal() == **principal)
        })
        .count();

    if covered == SPECIAL_PRINCIPALS.len() {
        // Inheritance is already set for every special principal
        return Ok(Decision::Unchanged);
    }
    if covered > 0 {
        return Err(AclError::PartialInheritance);
    }

    for principal in SPECIAL_PRINCIPALS {
        let num_allow = aces
            .iter()
            .filter(|ace| {
                ace.principal() == principal && ace.is_allow() && !ace.has_inheritance_flag()
            })
            .count();
        let num_deny = aces
            .iter()
            .filter(|ace| {
                ace.principal() == principal && ace.is_deny() && !ace.has_inheritance_flag()
            })
            .count();

        if num_allow > 1 || num_deny > 1 {
            return Err(AclError::AmbiguousRules(principal.to_string()));
        }
    }

    let added: Vec<Ace> = aces
        .iter()
        .filter(|ace| ace.is_allow() && ace.has_special_principal())
        .map(Ace::with_inherit_flags)
        .collect();

    Ok(Decision::Converted(added))
}

/// The parsed ACL of one filesystem object: the original ACEs in input order
/// plus the entries appended by a conversion.
#[derive(Debug, Clone)]
pub struct Acl {
    original: Vec<Ace>,
    added: Vec<Ace>,
}

impl Acl {
    /// Parse raw nfs4_getfacl output. Blank lines and `#` comment lines are
    /// skipped; every other line must be a well formed ACE.
    pub fn parse(text: &str) -> Result<Acl> {
        let mut original = Vec::new();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            original.push(line.parse()?);
        }

        Ok(Acl {
            original,
            added: Vec::new(),
        })
    }

    pub fn original(&self) -> &[Ace] {
        &self.original
    }

    pub fn added(&self) -> &[Ace] {
        &self.added
    }

    /// Run the rule engine once. Returns whether entries were appended; a
    /// rule violation leaves the ACL untouched and is reported to the caller.
    pub fn convert(&mut self) -> Result<bool> {
        match classify_and_convert(&self.original)? {
            Decision::Unchanged => Ok(false),
            Decision::Converted(added) => {
                self.added = added;
                Ok(true)
            }
        }
    }

    /// Serialize the full ACL: originals in input order, then the appended
    /// entries in generation order, one line per ACE.
    pub fn to_text(&self) -> String {
        let mut result = String::new();
        for ace in self.original.iter().chain(self.added.iter()) {
            result.push_str(&ace.to_string());
            result.push('\n');
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acl(text: &str) -> Acl {
        Acl::parse(text).unwrap()
    }

    const PLAIN: &str = "\
A::OWNER@:rwaDxtnNcy
A:g:GROUP@:rxtncy
A:g:EVERYONE@:rxtncy
";

    const CONVERTIBLE: &str = "\
A::OWNER@:rwaDxtnNcy
A:g:GROUP@:rxtncy
A:g:EVERYONE@:rxtncy
A:fdg:readers:rxtncy
A:fdg:writers:rwaDxtTnNcCy
";

    #[test]
    fn no_inheritance_is_unchanged() {
        let mut acl = acl(PLAIN);
        assert!(!acl.convert().unwrap());
        assert_eq!(acl.to_text(), PLAIN);
    }

    #[test]
    fn fully_migrated_is_unchanged() {
        let text = "\
A::OWNER@:rwaDxtnNcy
A:g:GROUP@:rxtncy
A:g:EVERYONE@:rxtncy
A:fdg:readers:rxtncy
A:fdi:OWNER@:rwaDxtnNcy
A:fdig:GROUP@:rxtncy
A:fdig:EVERYONE@:rxtncy
";
        let mut acl = acl(text);
        assert!(!acl.convert().unwrap());
        assert_eq!(acl.to_text(), text);
    }

    #[test]
    fn partial_coverage_is_rejected() {
        // one of three special principals covered
        let one = "\
A:fdi:OWNER@:rwaDxtnNcy
A:g:GROUP@:rxtncy
A:g:EVERYONE@:rxtncy
";
        assert!(matches!(
            acl(one).convert(),
            Err(AclError::PartialInheritance)
        ));

        // two of three special principals covered
        let two = "\
A:fdi:OWNER@:rwaDxtnNcy
A:fdig:GROUP@:rxtncy
A:g:EVERYONE@:rxtncy
";
        assert!(matches!(
            acl(two).convert(),
            Err(AclError::PartialInheritance)
        ));
    }

    #[test]
    fn duplicate_allow_rule_is_rejected() {
        let text = "\
A::OWNER@:rwaDxtnNcy
A::OWNER@:rxtncy
A:g:GROUP@:rxtncy
A:g:EVERYONE@:rxtncy
A:fdg:readers:rxtncy
";
        match acl(text).convert() {
            Err(AclError::AmbiguousRules(principal)) => assert_eq!(principal, "OWNER@"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn duplicate_deny_rule_is_rejected() {
        let text = "\
A::OWNER@:rwaDxtnNcy
D:g:GROUP@:w
D:g:GROUP@:a
A:g:GROUP@:rxtncy
A:g:EVERYONE@:rxtncy
A:fdg:readers:rxtncy
";
        match acl(text).convert() {
            Err(AclError::AmbiguousRules(principal)) => assert_eq!(principal, "GROUP@"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn converts_reference_scenario() {
        let mut acl = acl(CONVERTIBLE);
        assert!(acl.convert().unwrap());

        let added: Vec<String> = acl.added().iter().map(|a| a.to_string()).collect();
        assert_eq!(
            added,
            [
                "A:fdi:OWNER@:rwaDxtnNcy",
                "A:fdig:GROUP@:rxtncy",
                "A:fdig:EVERYONE@:rxtncy",
            ]
        );

        let expected = "\
A::OWNER@:rwaDxtnNcy
A:g:GROUP@:rxtncy
A:g:EVERYONE@:rxtncy
A:fdg:readers:rxtncy
A:fdg:writers:rwaDxtTnNcCy
A:fdi:OWNER@:rwaDxtnNcy
A:fdig:GROUP@:rxtncy
A:fdig:EVERYONE@:rxtncy
";
        assert_eq!(acl.to_text(), expected);
    }

    #[test]
    fn conversion_is_idempotent() {
        let mut first = acl(CONVERTIBLE);
        assert!(first.convert().unwrap());

        let mut second = Acl::parse(&first.to_text()).unwrap();
        assert!(!second.convert().unwrap());
        assert_eq!(second.to_text(), first.to_text());
    }

    #[test]
    fn deny_aces_are_not_cloned() {
        let text = "\
A::OWNER@:rwaDxtnNcy
A:g:GROUP@:rxtncy
A:g:EVERYONE@:rxtncy
D:g:EVERYONE@:w
A:fdg:readers:rxtncy
";
        let mut acl = acl(text);
        assert!(acl.convert().unwrap());
        assert!(acl.added().iter().all(Ace::is_allow));
        assert_eq!(acl.added().len(), 3);
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let text = "# file: /export/data\n# owner: root\n\nA::OWNER@:rwaDxtnNcy\n";
        let acl = acl(text);
        assert_eq!(acl.original().len(), 1);
        assert_eq!(acl.to_text(), "A::OWNER@:rwaDxtnNcy\n");
    }

    #[test]
    fn parse_propagates_format_errors() {
        assert!(matches!(
            Acl::parse("A::OWNER@\n"),
            Err(AclError::Format(_))
        ));
    }
}
