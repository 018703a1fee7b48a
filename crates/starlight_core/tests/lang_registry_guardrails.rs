use std::collections::HashMap;

use starlight_core::lang::{builtins, keywords, members, operators, punctuation};
use starlight_core::types::PrimitiveType;

#[test]
fn keyword_table_is_ordered_by_id() {
    for (i, info) in keywords::KEYWORDS.iter().enumerate() {
        assert_eq!(info.id as usize, i, "keyword table out of order at {:?}", info.id);
    }
}

#[test]
fn keywords_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, keywords::KeywordId> = HashMap::new();

    for info in keywords::KEYWORDS {
        assert_eq!(keywords::from_str(info.canonical), Some(info.id));
        assert_eq!(keywords::as_str(info.id), info.canonical);
        if let Some(prev) = seen.insert(info.canonical, info.id) {
            panic!("duplicate keyword spelling {:?}: {:?} and {:?}", info.canonical, prev, info.id);
        }
        for &alias in info.aliases {
            assert_eq!(keywords::from_str(alias), Some(info.id), "alias not resolvable: {alias}");
            if let Some(prev) = seen.insert(alias, info.id) {
                panic!("duplicate keyword alias {:?}: {:?} and {:?}", alias, prev, info.id);
            }
        }
    }
}

#[test]
fn operator_table_is_ordered_and_unique() {
    let mut seen = HashMap::new();
    for (i, info) in operators::OPERATORS.iter().enumerate() {
        assert_eq!(info.id as usize, i, "operator table out of order at {:?}", info.id);
        assert_eq!(operators::from_str(info.spelling), Some(info.id));
        assert!(seen.insert(info.spelling, info.id).is_none(), "duplicate operator {}", info.spelling);
    }
}

#[test]
fn punctuation_table_is_ordered_and_unique() {
    let mut seen = HashMap::new();
    for (i, info) in punctuation::PUNCTUATION.iter().enumerate() {
        assert_eq!(info.id as usize, i);
        assert_eq!(punctuation::from_str(info.spelling), Some(info.id));
        assert!(seen.insert(info.spelling, info.id).is_none());
        assert!(
            operators::from_str(info.spelling).is_none(),
            "{} is both punctuation and operator",
            info.spelling
        );
    }
}

#[test]
fn builtin_and_member_tables_are_ordered() {
    for (i, info) in builtins::BUILTIN_FUNCTIONS.iter().enumerate() {
        assert_eq!(info.id as usize, i);
        assert!(keywords::from_str(info.name).is_none(), "builtin {} shadows a keyword", info.name);
    }
    for (i, info) in members::MEMBERS.iter().enumerate() {
        assert_eq!(info.id as usize, i);
    }
}

#[test]
fn primitive_names_are_not_keywords() {
    for p in PrimitiveType::ALL {
        assert_eq!(PrimitiveType::from_str(p.as_str()), Some(*p));
        assert!(keywords::from_str(p.as_str()).is_none());
    }
}
