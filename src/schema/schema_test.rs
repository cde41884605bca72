#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_default_mode_is_first_registered() {
        assert_eq!(SearchMode::default(), SearchMode::ALL[0]);
        assert_eq!(SearchMode::default(), SearchMode::Accounts);
        assert!(SearchMode::Accounts.is_default());
        assert!(!SearchMode::Posts.is_default());
    }

    #[test]
    fn test_mode_keys_round_trip() {
        for mode in SearchMode::ALL {
            assert_eq!(SearchMode::from_key(mode.key()), Some(mode));
        }
        assert_eq!(SearchMode::from_key("bogus"), None);
        assert_eq!(SearchMode::from_key("Accounts"), None);
    }

    #[test]
    fn test_mode_serializes_as_key() {
        let json = serde_json::to_string(&SearchMode::ArchiveSessions).unwrap();
        assert_eq!(json, "\"archive_sessions\"");
    }

    #[test]
    fn test_every_mode_has_fields() {
        for mode in SearchMode::ALL {
            let schema = schema_for(mode);
            assert_eq!(schema.mode(), mode);
            assert!(!schema.fields().is_empty());
        }
    }

    #[test]
    fn test_first_fields() {
        assert_eq!(schema_for(SearchMode::Accounts).first_field().key, "url_parts");
        assert_eq!(
            schema_for(SearchMode::Posts).first_field().key,
            "publication_date"
        );
        assert_eq!(schema_for(SearchMode::Media).first_field().key, "ai_caption");
        assert_eq!(
            schema_for(SearchMode::ArchiveSessions).first_field().key,
            "archiving_date"
        );
    }

    #[test]
    fn test_text_fields_exclude_prefix_suffix_and_proximity() {
        let bio = schema_for(SearchMode::Accounts).field("bio").unwrap();

        assert_eq!(bio.value_type, ValueType::Text);
        assert!(bio.allows(OperatorKind::Like));
        assert!(bio.allows(OperatorKind::Equal));
        assert!(bio.allows(OperatorKind::IsEmpty));
        assert!(!bio.allows(OperatorKind::StartsWith));
        assert!(!bio.allows(OperatorKind::EndsWith));
        assert!(!bio.allows(OperatorKind::Proximity));
        assert!(!bio.allows(OperatorKind::Between));
    }

    #[test]
    fn test_date_fields_allow_ranges() {
        let date = schema_for(SearchMode::Posts)
            .field("publication_date")
            .unwrap();

        assert_eq!(date.value_type, ValueType::Date);
        assert!(date.allows(OperatorKind::Between));
        assert!(date.allows(OperatorKind::NotBetween));
        assert!(date.allows(OperatorKind::Less));
        assert!(!date.allows(OperatorKind::Like));
    }

    #[test]
    fn test_unknown_field_lookup() {
        assert!(schema_for(SearchMode::Media).field("bio").is_none());
    }

    #[test]
    fn test_operator_arity() {
        assert_eq!(OperatorKind::IsEmpty.arity(), 0);
        assert_eq!(OperatorKind::IsNotEmpty.arity(), 0);
        assert_eq!(OperatorKind::Equal.arity(), 1);
        assert_eq!(OperatorKind::Like.arity(), 1);
        assert_eq!(OperatorKind::Between.arity(), 2);
        assert_eq!(OperatorKind::NotBetween.arity(), 2);
        assert_eq!(OperatorKind::Proximity.arity(), 3);
    }

    #[test]
    fn test_operator_keys_round_trip() {
        for op in OperatorKind::ALL {
            assert_eq!(OperatorKind::from_key(op.key()), Some(op));
        }
        assert_eq!(OperatorKind::from_key("select_any_in"), None);
    }
}
