//! Key namespaces.
//!
//! Every key is `"<kind>/<id>"`. No namespace prefix is a prefix of another,
//! so an id can never reach into a different record kind's key space, and a
//! prefix scan over one kind returns only that kind.

use opex_store::prefix_upper_bound;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeySpace {
    Amount,
    Issue,
    Project,
    Distribution,
    Receivable,
    Journal,
}

impl KeySpace {
    pub const ALL: [KeySpace; 6] = [
        KeySpace::Amount,
        KeySpace::Issue,
        KeySpace::Project,
        KeySpace::Distribution,
        KeySpace::Receivable,
        KeySpace::Journal,
    ];

    /// Human-readable record kind, used in error messages.
    pub const fn label(self) -> &'static str {
        match self {
            KeySpace::Amount => "amount",
            KeySpace::Issue => "issue",
            KeySpace::Project => "project",
            KeySpace::Distribution => "distribution",
            KeySpace::Receivable => "receivable",
            KeySpace::Journal => "journal",
        }
    }

    pub const fn prefix(self) -> &'static str {
        match self {
            KeySpace::Amount => "amount/",
            KeySpace::Issue => "issue/",
            KeySpace::Project => "project/",
            KeySpace::Distribution => "distribution/",
            KeySpace::Receivable => "receivable/",
            KeySpace::Journal => "journal/",
        }
    }

    pub fn key(self, id: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.prefix().len() + id.len());
        key.extend_from_slice(self.prefix().as_bytes());
        key.extend_from_slice(id.as_bytes());
        key
    }

    /// The id portion of a key in this namespace.
    pub fn id_of(self, key: &[u8]) -> Option<String> {
        key.strip_prefix(self.prefix().as_bytes())
            .map(|id| String::from_utf8_lossy(id).into_owned())
    }

    /// Half-open scan range `[prefix, prefix_upper_bound)` for this kind.
    pub fn bounds(self) -> (Vec<u8>, Vec<u8>) {
        let start = self.prefix().as_bytes().to_vec();
        // Prefixes are ASCII ending in '/', so the bound always exists.
        let end = prefix_upper_bound(&start).unwrap_or_default();
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_prefix_shadows_another() {
        for a in KeySpace::ALL {
            for b in KeySpace::ALL {
                if a != b {
                    assert!(!a.prefix().starts_with(b.prefix()), "{a:?} vs {b:?}");
                }
            }
        }
    }

    #[test]
    fn keys_use_explicit_delimiter() {
        assert_eq!(KeySpace::Project.key("P1"), b"project/P1".to_vec());
        assert_eq!(KeySpace::Amount.key("FG"), b"amount/FG".to_vec());
    }

    #[test]
    fn crafted_ids_stay_in_their_namespace() {
        // The old `id + "project"` layout let "X" + "project" collide with
        // other kinds; a leading kind prefix cannot.
        let (start, end) = KeySpace::Issue.bounds();
        let crafted = KeySpace::Project.key("../issue/P1");
        assert!(!(crafted >= start && crafted < end));
    }

    #[test]
    fn bounds_cover_every_id() {
        let (start, end) = KeySpace::Receivable.bounds();
        for id in ["", "0", "zzz", "\u{10FFFF}"] {
            let key = KeySpace::Receivable.key(id);
            assert!(key >= start && key < end, "{id:?}");
        }
    }

    #[test]
    fn id_of_strips_prefix() {
        let key = KeySpace::Journal.key("confirm/P1/BK");
        assert_eq!(KeySpace::Journal.id_of(&key).as_deref(), Some("confirm/P1/BK"));
        assert_eq!(KeySpace::Issue.id_of(&key), None);
    }
}
