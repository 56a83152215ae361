use flora_app::config::{apply_api_key_override, from_toml_str};
use flora_app::gallery::{search, GalleryFilter};
use flora_app::nav::View;
use flora_app::share::{parse_share_url, qr_filename, share_url};
use flora_app::state::{update, Action, AppState, Effect};
use flora_core::{FloraConfig, FlowerDraft, Language, RecordId};
use flora_test_utils::{fixtures, generators};
use proptest::prelude::*;

fn ready(ai_enabled: bool) -> AppState {
    let mut state = AppState::new(ai_enabled);
    update(&mut state, Action::Loaded(Ok(fixtures::catalog())));
    state
}

#[test]
fn config_file_round_trip() {
    let config = FloraConfig::default();
    let text = toml::to_string(&config).expect("serialize");
    assert_eq!(from_toml_str(&text).expect("parse"), config);
}

#[test]
fn env_key_enables_provider() {
    let mut config = from_toml_str("[provider]\nmodel = \"gemini-2.0-flash-lite\"").expect("parse");
    assert!(!config.provider.is_configured());
    apply_api_key_override(&mut config, Some("k".to_string()));
    assert!(config.provider.is_configured());
}

#[test]
fn back_from_detail_clears_view_only() {
    let mut state = ready(false);
    update(
        &mut state,
        Action::OpenSharedLink("http://localhost:5173/?flower=rose-1".to_string()),
    );
    update(&mut state, Action::Back);
    assert_eq!(state.view, View::Gallery);
    assert!(!state.view_only);
    assert!(state.detail.is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn share_url_round_trips(id in generators::arb_record_id()) {
        let url = share_url("http://localhost:5173/", &id);
        prop_assert_eq!(parse_share_url(&url), Some(id));
    }

    #[test]
    fn qr_filename_has_no_whitespace(name in "[A-Za-z ]{1,30}") {
        let file = qr_filename(&name);
        prop_assert!(file.ends_with("-QR.png"));
        prop_assert!(!file.contains(char::is_whitespace));
    }

    #[test]
    fn search_results_are_a_subset(query in "[a-z]{0,4}") {
        let catalog = fixtures::catalog();
        let found = search(&catalog, &query);
        prop_assert!(found.len() <= catalog.len());
        for flower in found {
            prop_assert!(flower.matches_query(&query));
        }
    }

    #[test]
    fn empty_filter_shows_everything(flowers in proptest::collection::vec(generators::arb_flower(), 0..8)) {
        prop_assert_eq!(GalleryFilter::default().apply(&flowers).len(), flowers.len());
    }

    #[test]
    fn blank_names_never_reach_the_store(name in "[ \t]{0,6}") {
        let mut state = ready(false);
        update(&mut state, Action::NewRecord);
        update(&mut state, Action::FormChanged(FlowerDraft::new(name)));
        prop_assert!(update(&mut state, Action::Submit).is_empty());
    }

    #[test]
    fn only_latest_translation_is_applied(
        languages in proptest::collection::vec(generators::arb_target_language(), 2..6),
    ) {
        let mut state = ready(true);
        let rose = fixtures::rose();
        update(&mut state, Action::Select(rose.id.clone()));

        let mut tags = Vec::new();
        for language in &languages {
            for effect in update(&mut state, Action::SelectLanguage(*language)) {
                if let Effect::Translate { tag, .. } = effect {
                    tags.push((tag, *language));
                }
            }
        }

        // Deliver every response newest-first; only the newest may apply.
        for (tag, language) in tags.iter().rev() {
            update(
                &mut state,
                Action::TranslationResolved {
                    tag: tag.clone(),
                    result: Ok(Some(fixtures::tagged_translation(&rose, *language))),
                },
            );
        }

        let last = *languages.last().expect("non-empty");
        let detail = state.detail.as_ref().expect("detail");
        prop_assert_eq!(detail.active_language(), last);
        prop_assert_eq!(detail.resolved().name, format!("Rose [{}]", last.code()));
        prop_assert_eq!(state.ai_language, last);
    }

    #[test]
    fn selected_record_matches_view(index in 0usize..3) {
        let mut state = ready(false);
        let id: RecordId = fixtures::catalog()[index].id.clone();
        update(&mut state, Action::Select(id.clone()));
        prop_assert_eq!(state.view.record_id(), Some(&id));
        prop_assert_eq!(state.detail.as_ref().map(|d| d.flower().id.clone()), Some(id));
        prop_assert_eq!(state.ai_language, Language::BASE);
    }
}
