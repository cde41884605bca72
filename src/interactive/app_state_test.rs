#[cfg(test)]
mod tests {
    use super::super::app_state::*;
    use super::super::commands::Command;
    use super::super::events::Message;
    use crate::query::{Combinator, FilterNode, Group, Rule, SearchQuery, empty_tree};
    use crate::schema::{OperatorKind, SearchMode};
    use crate::url_codec;

    fn committed(command: &Command) -> &SearchQuery {
        match command {
            Command::Commit(query) => query,
            other => panic!("Expected Commit, got {other:?}"),
        }
    }

    fn like(field: &str, value: &str) -> FilterNode {
        FilterNode::Rule(Rule::new(field, OperatorKind::Like, vec![value.to_string()]))
    }

    #[test]
    fn test_new_page_from_query() {
        let page = SearchPage::new(url_codec::decode(
            "s=jane&f=(and:!((in:!(jane,(var:bio)))))",
        ));

        assert_eq!(page.staged_term(), "jane");
        assert_eq!(
            page.filter_tree(),
            &Group::new(Combinator::And, vec![like("bio", "jane")])
        );
    }

    #[test]
    fn test_default_page() {
        let page = SearchPage::default();
        assert_eq!(page.query(), &SearchQuery::default());
        assert_eq!(page.filter_tree(), &empty_tree(SearchMode::Accounts));
        assert_eq!(page.staged_term(), "");
    }

    #[test]
    fn test_typing_only_stages() {
        let mut page = SearchPage::default();

        assert_eq!(page.update(Message::TermTyped("c".to_string())), Command::None);
        assert_eq!(page.update(Message::TermTyped("ca".to_string())), Command::None);

        assert_eq!(page.staged_term(), "ca");
        assert_eq!(page.query().search_term, "");
    }

    #[test]
    fn test_submit_commits_staged_term_and_resets_page() {
        let mut page = SearchPage::new(SearchQuery::default().with_page(4));

        page.update(Message::TermTyped("cats".to_string()));
        let command = page.update(Message::TermSubmitted);

        let query = committed(&command);
        assert_eq!(query.search_term, "cats");
        assert_eq!(query.page_number, 1);
        assert_eq!(page.query(), query);
    }

    #[test]
    fn test_mode_switch_resets_filters_and_page() {
        let mut page = SearchPage::new(SearchQuery::default().with_term("jane"));
        page.update(Message::FiltersApplied(Group::new(
            Combinator::And,
            vec![like("bio", "x")],
        )));
        page.update(Message::PageSelected(3));

        let command = page.update(Message::ModeSelected(SearchMode::Posts));
        let query = committed(&command);

        assert_eq!(query.search_mode, SearchMode::Posts);
        assert_eq!(query.search_term, "jane");
        assert_eq!(query.advanced_filters, None);
        assert_eq!(query.page_number, 1);
        assert_eq!(page.filter_tree(), &empty_tree(SearchMode::Posts));
    }

    #[test]
    fn test_same_mode_is_noop() {
        let mut page = SearchPage::default();
        assert_eq!(page.update(Message::ModeSelected(SearchMode::Accounts)), Command::None);
    }

    #[test]
    fn test_mode_switch_keeps_unsubmitted_typing_staged() {
        let mut page = SearchPage::default();
        page.update(Message::TermTyped("draft".to_string()));

        let command = page.update(Message::ModeSelected(SearchMode::Media));
        assert_eq!(committed(&command).search_term, "");
        assert_eq!(page.staged_term(), "draft");
    }

    #[test]
    fn test_filters_applied() {
        let mut page = SearchPage::new(SearchQuery::default().with_page(2));
        let tree = Group::new(Combinator::Or, vec![like("display_name", "jane")]);

        let command = page.update(Message::FiltersApplied(tree.clone()));
        let query = committed(&command);

        assert_eq!(query.page_number, 1);
        assert_eq!(
            query.advanced_filters.as_ref().map(|f| f.to_value()),
            Some(serde_json::json!({"or": [{"in": ["jane", {"var": "display_name"}]}]}))
        );
        assert_eq!(page.filter_tree(), &tree);
    }

    #[test]
    fn test_invalid_filters_are_sanitized() {
        let mut page = SearchPage::default();
        let tree = Group::new(
            Combinator::And,
            vec![like("bio", "kept"), like("caption", "dropped")],
        );

        page.update(Message::FiltersApplied(tree));
        assert_eq!(
            page.filter_tree(),
            &Group::new(Combinator::And, vec![like("bio", "kept")])
        );
    }

    #[test]
    fn test_filters_with_unset_operator_stay_editable() {
        let mut page = SearchPage::default();
        let tree = Group::new(
            Combinator::And,
            vec![
                like("bio", "x"),
                FilterNode::Rule(Rule {
                    field: "notes".to_string(),
                    operator: None,
                    value: vec![String::new()],
                }),
            ],
        );

        page.update(Message::FiltersApplied(tree.clone()));
        assert_eq!(page.filter_tree(), &tree);
        assert!(page.query().advanced_filters.is_some());
    }

    #[test]
    fn test_filters_cleared() {
        let mut page = SearchPage::default();
        page.update(Message::FiltersApplied(Group::new(
            Combinator::And,
            vec![like("bio", "x")],
        )));
        page.update(Message::NextPage);

        let command = page.update(Message::FiltersCleared);
        let query = committed(&command);

        assert_eq!(query.advanced_filters, None);
        assert_eq!(query.page_number, 1);
        assert_eq!(page.filter_tree(), &empty_tree(SearchMode::Accounts));
    }

    #[test]
    fn test_paging() {
        let mut page = SearchPage::default();

        assert_eq!(page.update(Message::PreviousPage), Command::None);

        assert_eq!(committed(&page.update(Message::NextPage)).page_number, 2);
        assert_eq!(committed(&page.update(Message::NextPage)).page_number, 3);
        assert_eq!(committed(&page.update(Message::PreviousPage)).page_number, 2);
        assert_eq!(committed(&page.update(Message::PageSelected(0))).page_number, 1);
        assert_eq!(committed(&page.update(Message::PageSelected(9))).page_number, 9);
    }

    #[test]
    fn test_page_size_floor() {
        let mut page = SearchPage::default();

        assert_eq!(committed(&page.update(Message::PageSizeSelected(5))).page_size, 20);
        assert_eq!(committed(&page.update(Message::PageSizeSelected(50))).page_size, 50);
    }

    #[test]
    fn test_location_change_adopts_query() {
        let mut page = SearchPage::default();
        page.update(Message::TermTyped("draft".to_string()));

        let command = page.update(Message::LocationChanged("?s=jane&sm=posts".to_string()));
        let expected = SearchQuery::new(SearchMode::Posts).with_term("jane");

        assert_eq!(command, Command::Submit(expected.clone()));
        assert_eq!(page.query(), &expected);
        assert_eq!(page.staged_term(), "jane");
        assert_eq!(page.filter_tree(), &empty_tree(SearchMode::Posts));
    }

    #[test]
    fn test_location_matching_query_is_ignored() {
        let mut page = SearchPage::default();
        let command = page.update(Message::TermTyped("cats".to_string()));
        assert_eq!(command, Command::None);

        let command = page.update(Message::TermSubmitted);
        let url = url_codec::encode(committed(&command));

        assert_eq!(page.update(Message::LocationChanged(url)), Command::None);
    }
}
