use std::fmt;
use std::str::FromStr;

use crate::error::AclError;

/// The three special principals that receive symbolic rather than named
/// permissions: owner, owning group and everyone.
pub const SPECIAL_PRINCIPALS: [&str; 3] = ["OWNER@", "GROUP@", "EVERYONE@"];

/// Flags marking an ACE as propagating to newly created child objects.
const INHERITANCE_FLAGS: [char; 3] = ['i', 'f', 'd'];

/// Access type of an ACE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AceKind {
    Allow,
    Deny,
    Audit,
}

impl AceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AceKind::Allow => "A",
            AceKind::Deny => "D",
            AceKind::Audit => "U",
        }
    }
}

impl FromStr for AceKind {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(AceKind::Allow),
            "D" => Ok(AceKind::Deny),
            "U" => Ok(AceKind::Audit),
            other => Err(AclError::UnknownKind(other.to_string())),
        }
    }
}

/// One line of nfs4_getfacl output: `type:flags:principal:permissions`.
///
/// An ACE is immutable once parsed; conversion builds new values instead of
/// mutating existing ones. Flags and permissions are carried opaquely so that
/// serialization is bit exact with the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ace {
    kind: AceKind,
    flags: String,
    principal: String,
    permissions: String,
}

impl Ace {
    pub fn kind(&self) -> AceKind {
        self.kind
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn permissions(&self) -> &str {
        &self.permissions
    }

    /// True if the ACE propagates to child objects in any way (file-inherit,
    /// directory-inherit or inherit-only).
    pub fn has_inheritance_flag(&self) -> bool {
        self.flags.chars().any(|c| INHERITANCE_FLAGS.contains(&c))
    }

    pub fn has_special_principal(&self) -> bool {
        SPECIAL_PRINCIPALS
            .iter()
            .any(|principal| self.principal == *principal)
    }

    pub fn is_allow(&self) -> bool {
        self.kind == AceKind::Allow
    }

    pub fn is_deny(&self) -> bool {
        self.kind == AceKind::Deny
    }

    /// Build the inheritable copy of this ACE: same kind, principal and
    /// permissions, with file-inherit, directory-inherit and inherit-only
    /// prepended to the original flags. Existing flag characters (such as the
    /// group designator `g`) are preserved verbatim.
    pub fn with_inherit_flags(&self) -> Ace {
        Ace {
            kind: self.kind,
            flags: format!("fdi{}", self.flags),
            principal: self.principal.clone(),
            permissions: self.permissions.clone(),
        }
    }
}

impl FromStr for Ace {
    type Err = AclError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 4 {
            return Err(AclError::Format(line.to_string()));
        }

        Ok(Ace {
            kind: fields[0].parse()?,
            flags: fields[1].to_string(),
            principal: fields[2].to_string(),
            permissions: fields[3].to_string(),
        })
    }
}

impl fmt::Display for Ace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.kind.as_str(),
            self.flags,
            self.principal,
            self.permissions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_allow_ace() {
        let ace: Ace = "A:fdg:writers:rwaDxtTnNcCy".parse().unwrap();
        assert_eq!(ace.kind(), AceKind::Allow);
        assert_eq!(ace.flags(), "fdg");
        assert_eq!(ace.principal(), "writers");
        assert_eq!(ace.permissions(), "rwaDxtTnNcCy");
    }

    #[test]
    fn parse_empty_flags() {
        let ace: Ace = "A::OWNER@:rwaDxtnNcy".parse().unwrap();
        assert_eq!(ace.flags(), "");
        assert!(ace.has_special_principal());
        assert!(!ace.has_inheritance_flag());
    }

    #[test]
    fn parse_rejects_wrong_field_count() {
        assert!(matches!(
            "A:g:GROUP@".parse::<Ace>(),
            Err(AclError::Format(_))
        ));
        assert!(matches!(
            "A:g:GROUP@:rxtncy:extra".parse::<Ace>(),
            Err(AclError::Format(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        assert!(matches!(
            "X:g:GROUP@:rxtncy".parse::<Ace>(),
            Err(AclError::UnknownKind(_))
        ));
    }

    #[test]
    fn round_trip() {
        for line in [
            "A::OWNER@:rwaDxtnNcy",
            "A:g:GROUP@:rxtncy",
            "D:fd:EVERYONE@:w",
            "U:g:auditors:r",
            "A:fdig:GROUP@:rxtncy",
        ] {
            let ace: Ace = line.parse().unwrap();
            assert_eq!(ace.to_string(), line);
        }
    }

    #[test]
    fn inheritance_flag_detection() {
        for line in ["A:f:readers:r", "A:d:readers:r", "A:i:readers:r"] {
            let ace: Ace = line.parse().unwrap();
            assert!(ace.has_inheritance_flag(), "{line}");
        }
        let ace: Ace = "A:g:readers:r".parse().unwrap();
        assert!(!ace.has_inheritance_flag());
    }

    #[test]
    fn with_inherit_flags_prepends_fdi() {
        let ace: Ace = "A:g:GROUP@:rxtncy".parse().unwrap();
        let inherited = ace.with_inherit_flags();
        assert_eq!(inherited.to_string(), "A:fdig:GROUP@:rxtncy");

        let ace: Ace = "A::OWNER@:rwaDxtnNcy".parse().unwrap();
        assert_eq!(ace.with_inherit_flags().to_string(), "A:fdi:OWNER@:rwaDxtnNcy");
    }

    #[test]
    fn special_principal_is_exact_match() {
        let ace: Ace = "A:g:OWNER:r".parse().unwrap();
        assert!(!ace.has_special_principal());
        let ace: Ace = "A:g:owner@:r".parse().unwrap();
        assert!(!ace.has_special_principal());
    }
}
