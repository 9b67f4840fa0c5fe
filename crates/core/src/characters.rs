//! Character name matching used by import deduplication and event linking.
//!
//! Names are compared in a normalised form: lower-cased, punctuation other
//! than apostrophes and hyphens removed, whitespace collapsed. A character is
//! known by its name, nickname and every comma-separated alias.

use std::collections::HashSet;

/// Anything that carries the three name fields of a character.
pub trait NamedCharacter {
    fn name(&self) -> &str;
    fn nickname(&self) -> Option<&str>;
    fn aliases(&self) -> Option<&str>;
}

/// Minimum length of a first name before it may be used as a fallback key.
pub const MIN_FIRST_NAME_CHARS: usize = 3;

/// Normalise a name for comparison.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '\'' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .to_lowercase();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a comma-separated alias string, trimming and dropping empties and
/// case-insensitive duplicates. Order of first appearance is kept.
pub fn parse_aliases(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .filter(|a| seen.insert(normalize_name(a)))
        .map(str::to_string)
        .collect()
}

/// All normalised keys a character answers to.
pub fn name_keys<C: NamedCharacter + ?Sized>(character: &C) -> Vec<String> {
    let mut keys = vec![normalize_name(character.name())];
    if let Some(nick) = character.nickname() {
        keys.push(normalize_name(nick));
    }
    if let Some(aliases) = character.aliases() {
        keys.extend(parse_aliases(aliases).iter().map(|a| normalize_name(a)));
    }
    keys.retain(|k| !k.is_empty());
    keys.dedup();
    keys
}

/// First word of a multi-word name, if long enough to be a useful key.
pub fn first_name(name: &str) -> Option<&str> {
    let mut words = name.split_whitespace();
    let first = words.next()?;
    words.next()?;
    (first.chars().count() >= MIN_FIRST_NAME_CHARS).then_some(first)
}

/// Resolve a free-form name (as a model wrote it) to one of `existing`.
///
/// Tries every exact key first. Failing that, a single-word name matches
/// the unique character whose first name it is; ambiguity yields `None`.
pub fn resolve_name<'a, C: NamedCharacter>(name: &str, existing: &'a [C]) -> Option<&'a C> {
    let key = normalize_name(name);
    if key.is_empty() {
        return None;
    }
    if let Some(found) = existing.iter().find(|c| name_keys(*c).contains(&key)) {
        return Some(found);
    }
    if key.contains(' ') || key.chars().count() < MIN_FIRST_NAME_CHARS {
        return None;
    }
    let mut by_first = existing
        .iter()
        .filter(|c| first_name(c.name()).is_some_and(|f| normalize_name(f) == key));
    match (by_first.next(), by_first.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Find an existing character matching a candidate's name or any alias.
pub fn find_match<'a, C: NamedCharacter>(
    name: &str,
    aliases: &[String],
    existing: &'a [C],
) -> Option<&'a C> {
    std::iter::once(name)
        .chain(aliases.iter().map(String::as_str))
        .find_map(|n| resolve_name(n, existing))
}

/// Merge incoming aliases into an existing alias string.
///
/// Aliases equal to any of the character's own keys (`exclude`) are
/// skipped. Returns `None` when nothing new was added.
pub fn merge_aliases(existing: Option<&str>, incoming: &[String], exclude: &[String]) -> Option<String> {
    let mut merged = existing.map(parse_aliases).unwrap_or_default();
    let mut known: HashSet<String> = merged.iter().map(|a| normalize_name(a)).collect();
    known.extend(exclude.iter().map(|e| normalize_name(e)));

    let mut added = false;
    for alias in incoming {
        let alias = alias.trim();
        let key = normalize_name(alias);
        if key.is_empty() || !known.insert(key) {
            continue;
        }
        merged.push(alias.to_string());
        added = true;
    }
    added.then(|| merged.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person {
        name: &'static str,
        nickname: Option<&'static str>,
        aliases: Option<&'static str>,
    }

    impl NamedCharacter for Person {
        fn name(&self) -> &str {
            self.name
        }
        fn nickname(&self) -> Option<&str> {
            self.nickname
        }
        fn aliases(&self) -> Option<&str> {
            self.aliases
        }
    }

    fn cast() -> Vec<Person> {
        vec![
            Person { name: "Elizabeth Bennet", nickname: Some("Lizzy"), aliases: Some("Eliza, Miss Bennet") },
            Person { name: "Fitzwilliam Darcy", nickname: None, aliases: Some("Mr. Darcy") },
            Person { name: "Jane Bennet", nickname: None, aliases: None },
        ]
    }

    #[test]
    fn normalises_case_punctuation_and_spacing() {
        assert_eq!(normalize_name("  Mr.  DARCY "), "mr darcy");
        assert_eq!(normalize_name("O'Brien-Smith"), "o'brien-smith");
    }

    #[test]
    fn parse_aliases_drops_blanks_and_duplicates() {
        assert_eq!(parse_aliases(" Eliza, ,eliza, Lizzy "), vec!["Eliza", "Lizzy"]);
    }

    #[test]
    fn resolves_by_name_nickname_and_alias() {
        let cast = cast();
        assert_eq!(resolve_name("lizzy", &cast).map(|c| c.name), Some("Elizabeth Bennet"));
        assert_eq!(resolve_name("Mr Darcy", &cast).map(|c| c.name), Some("Fitzwilliam Darcy"));
        assert_eq!(resolve_name("Jane Bennet", &cast).map(|c| c.name), Some("Jane Bennet"));
        assert!(resolve_name("Wickham", &cast).is_none());
    }

    #[test]
    fn first_name_fallback_requires_uniqueness() {
        let cast = cast();
        assert_eq!(resolve_name("Fitzwilliam", &cast).map(|c| c.name), Some("Fitzwilliam Darcy"));
        let twins = vec![
            Person { name: "Anna Smith", nickname: None, aliases: None },
            Person { name: "Anna Jones", nickname: None, aliases: None },
        ];
        assert!(resolve_name("Anna", &twins).is_none());
    }

    #[test]
    fn find_match_checks_aliases() {
        let cast = cast();
        let found = find_match("Miss Elizabeth", &["Eliza".to_string()], &cast);
        assert_eq!(found.map(|c| c.name), Some("Elizabeth Bennet"));
    }

    #[test]
    fn merge_aliases_adds_only_new_names() {
        let merged = merge_aliases(
            Some("Eliza"),
            &["eliza".into(), "Lizzy".into(), "Miss Lizzy".into()],
            &["Elizabeth Bennet".into(), "Lizzy".into()],
        );
        assert_eq!(merged.as_deref(), Some("Eliza, Miss Lizzy"));
        assert_eq!(merge_aliases(Some("Eliza"), &["ELIZA".into()], &[]), None);
        assert_eq!(merge_aliases(None, &["Beth".into()], &[]).as_deref(), Some("Beth"));
    }
}
