use accounthist_core::Facet;
use accounthist_test_sdk::name;

use crate::{ActionResponse, ActionsRequest, QueryService};


fn account(value: &str) -> Facet {
    Facet::Account(name(value))
}

fn global_sequences(actions: &[ActionResponse]) -> Vec<u64> {
    actions
        .iter()
        .map(|response| response.action.global_sequence().unwrap())
        .collect()
}

/// Follow the cursors page after page until the history is exhausted
async fn collect_pages(service: &QueryService, facet: Facet, limit: i64) -> Vec<ActionResponse> {
    let mut request = ActionsRequest::new(facet).with_limit(limit);
    let mut actions = Vec::new();

    loop {
        let page = service.get_actions_page(&request).await.unwrap();
        assert_eq!(page.has_previous_page, request.cursor.is_some());

        actions.extend(page.actions.iter().cloned());

        match page.end_cursor() {
            Some(cursor) if page.has_next_page => {
                request = request.with_cursor(cursor);
            }
            _ => break,
        }
    }

    actions
}
