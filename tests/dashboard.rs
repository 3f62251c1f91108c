// Integration tests for the server-rendered console pages

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use bot_console::models::{BotStatus, Language, PersonaStyle, UrlScope, UserRole, UserStatus};
use common::test_app;
use std::time::Duration;

const CONFIG_FORM: &str = "name=CodingBot+Prime&welcome_message=Hello&idle_timeout=45\
&voice_search_enabled=true&supported_languages=en&system_prompt=Be+brief\
&persona_style=friendly&fallback_message=Sorry&primary_color=%23112233\
&secondary_color=%23445566&bot_position=top-left&welcome_popup_text=Hi";

#[tokio::test]
async fn test_overview_lists_bots_and_stats() {
    let app = test_app();
    let resp = app.get("/").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("CodingBot 01"));
    assert!(resp.body.contains("2100"));
    assert!(resp.body.contains("1.1s"));
}

#[tokio::test]
async fn test_bots_page_search() {
    let app = test_app();
    let resp = app.get("/bots?search=coding").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("CodingBot 01"));
    assert!(!resp.body.contains("Sales Assistant"));
}

#[tokio::test]
async fn test_create_bot_redirects_with_notice() {
    let app = test_app();
    let resp = app.form("/bots", "name=Support+Helper&description=Answers+questions").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location.as_deref(), Some("/bots"));

    let page = app.get("/bots").await;
    assert!(page.body.contains("Bot created successfully!"));
    assert!(page.body.contains("Support Helper"));

    // The notice is shown once.
    assert!(!app.get("/bots").await.body.contains("Bot created successfully!"));

    let store = app.state.store.read().await;
    let bot = store.bot("support-helper").unwrap();
    assert_eq!(bot.status, BotStatus::Inactive);
    assert_eq!(bot.created_by, "dashboard");
}

#[tokio::test]
async fn test_create_bot_with_blank_name_rerenders_dialog() {
    let app = test_app();
    let resp = app.form("/bots", "name=&description=Nameless").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Bot name is required"));
    assert!(resp.body.contains("Nameless"));
    assert_eq!(app.state.store.read().await.bots().len(), 5);
}

#[tokio::test]
async fn test_toggle_and_delete_bot() {
    let app = test_app();
    let resp = app.form("/bots/coding-bot-01/toggle", "").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(
        app.state.store.read().await.bot("coding-bot-01").unwrap().status,
        BotStatus::Inactive
    );

    let resp = app.form("/bots/virtual-assistant/delete", "").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    let store = app.state.store.read().await;
    assert!(store.bot("virtual-assistant").is_err());
    assert!(store
        .users()
        .iter()
        .all(|u| !u.assigned_bots.iter().any(|b| b == "virtual-assistant")));
}

#[tokio::test]
async fn test_unknown_bot_renders_error_page() {
    let app = test_app();
    let resp = app.get("/bots/nope/config").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.contains("not found"));

    let resp = app.get("/no/such/page").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.contains("Page not found"));
}

#[tokio::test]
async fn test_config_tabs_render() {
    let app = test_app();
    for tab in ["basic", "behavior", "appearance", "knowledge", "bogus"] {
        let resp = app.get(&format!("/bots/coding-bot-01/config?tab={tab}")).await;
        assert_eq!(resp.status, StatusCode::OK, "tab {tab}");
    }
    let resp = app.get("/bots/coding-bot-01/config?tab=knowledge").await;
    assert!(resp.body.contains("Product_Guide.pdf"));
    assert!(resp.body.contains("https://example.com/docs"));
}

#[tokio::test]
async fn test_language_toggle_does_not_save() {
    let app = test_app();
    let resp = app
        .form(
            "/bots/coding-bot-01/config?tab=basic",
            &format!("{CONFIG_FORM}&toggle_lang=ar"),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("en,ar"));

    let store = app.state.store.read().await;
    let bot = store.bot("coding-bot-01").unwrap();
    assert_eq!(bot.name, "CodingBot 01");
    assert_eq!(bot.settings.supported_languages, vec![Language::En]);
}

#[tokio::test]
async fn test_save_config_persists_settings() {
    let app = test_app();
    let resp = app.form("/bots/coding-bot-01/config?tab=appearance", CONFIG_FORM).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(
        resp.location.as_deref(),
        Some("/bots/coding-bot-01/config?tab=appearance")
    );

    {
        let store = app.state.store.read().await;
        let bot = store.bot("coding-bot-01").unwrap();
        assert_eq!(bot.name, "CodingBot Prime");
        assert_eq!(bot.settings.idle_timeout, 45);
        assert_eq!(bot.settings.persona_style, PersonaStyle::Friendly);
        assert_eq!(bot.settings.primary_color, "#112233");
        assert!(!bot.settings.feedback_enabled);
        assert!(!bot.settings.conversation_memory);
    }

    let page = app.get("/bots/coding-bot-01/config?tab=appearance").await;
    assert!(page.body.contains("Bot configuration saved successfully!"));
}

#[tokio::test]
async fn test_invalid_config_is_not_saved() {
    let app = test_app();
    let body = CONFIG_FORM.replace("idle_timeout=45", "idle_timeout=soon");
    let resp = app.form("/bots/coding-bot-01/config?tab=basic", &body).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Idle timeout must be a positive number of seconds"));
    assert_eq!(
        app.state.store.read().await.bot("coding-bot-01").unwrap().name,
        "CodingBot 01"
    );
}

#[tokio::test]
async fn test_add_url_and_confirmed_delete() {
    let app = test_app();
    let resp = app
        .form("/bots/coding-bot-01/urls", "url=https%3A%2F%2Fblog.example.com&scope=entire-site")
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(
        resp.location.as_deref(),
        Some("/bots/coding-bot-01/config?tab=knowledge")
    );

    let url_id = {
        let store = app.state.store.read().await;
        let kb = store.knowledge("coding-bot-01").unwrap();
        assert_eq!(kb.urls.len(), 3);
        kb.urls[2].id.clone()
    };

    app.form("/bots/coding-bot-01/knowledge/delete", &format!("kind=url&id={url_id}"))
        .await;
    let page = app.get("/bots/coding-bot-01/config?tab=knowledge").await;
    assert!(page.body.contains("/knowledge/delete/confirm"));

    app.form("/bots/coding-bot-01/knowledge/delete/confirm", "").await;
    let page = app.get("/bots/coding-bot-01/config?tab=knowledge").await;
    assert!(page.body.contains("URL deleted successfully!"));

    let store = app.state.store.read().await;
    let kb = store.knowledge("coding-bot-01").unwrap();
    assert_eq!(kb.urls.len(), 2);
    assert!(kb.pending_delete().is_none());
}

#[tokio::test]
async fn test_cancelled_delete_keeps_item() {
    let app = test_app();
    let doc_id = app.state.store.read().await.knowledge("coding-bot-01").unwrap().documents[0]
        .id
        .clone();
    app.form("/bots/coding-bot-01/knowledge/delete", &format!("kind=document&id={doc_id}"))
        .await;
    assert!(app
        .state
        .store
        .read()
        .await
        .knowledge("coding-bot-01")
        .unwrap()
        .pending_delete()
        .is_some());

    app.form("/bots/coding-bot-01/knowledge/delete/cancel", "").await;
    let store = app.state.store.read().await;
    let kb = store.knowledge("coding-bot-01").unwrap();
    assert_eq!(kb.documents.len(), 3);
    assert!(kb.pending_delete().is_none());
}

#[tokio::test]
async fn test_url_scope_defaults_to_entire_site() {
    let app = test_app();
    let page = app.get("/bots/coding-bot-01/config?tab=knowledge").await;
    assert!(page.body.contains(r#"<option value="entire-site" selected>"#));

    app.form("/bots/coding-bot-01/urls", "url=https%3A%2F%2Fdocs.example.com").await;
    app.form("/bots/coding-bot-01/urls", "url=https%3A%2F%2Fhelp.example.com&scope=bogus").await;
    let store = app.state.store.read().await;
    let urls = &store.knowledge("coding-bot-01").unwrap().urls;
    assert_eq!(urls.len(), 4);
    assert!(urls[2..].iter().all(|u| u.scope == UrlScope::EntireSite));
}

#[tokio::test]
async fn test_blank_url_shows_error_notice() {
    let app = test_app();
    app.form("/bots/coding-bot-01/urls", "url=&scope=entire-site").await;
    let page = app.get("/bots/coding-bot-01/config?tab=knowledge").await;
    assert!(page.body.contains("Please enter a valid URL"));
    assert_eq!(app.state.store.read().await.knowledge("coding-bot-01").unwrap().urls.len(), 2);
}

#[tokio::test]
async fn test_multipart_upload_is_ingested() {
    let app = test_app();
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"manual.pdf\"\r\n\
Content-Type: application/pdf\r\n\r\n0123456789\r\n\
--{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"\"\r\n\
Content-Type: application/octet-stream\r\n\r\n\r\n\
--{b}--\r\n",
        b = boundary
    );
    let req = Request::post("/bots/sales-assistant/documents")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let resp = app.send(req).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    {
        let store = app.state.store.read().await;
        let docs = &store.knowledge("sales-assistant").unwrap().documents;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "manual.pdf");
        assert_eq!(docs[0].size, 10);
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    let page = app.get("/bots/sales-assistant/config?tab=knowledge").await;
    assert!(page.body.contains("1 file(s) uploaded successfully!"));
    assert!(page.body.contains("Completed"));
}

#[tokio::test]
async fn test_knowledge_settings_form() {
    let app = test_app();
    let resp = app
        .form(
            "/bots/coding-bot-01/knowledge/settings",
            "auto_index_enabled=true&chunk_size=1000&chunk_overlap=200",
        )
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    {
        let store = app.state.store.read().await;
        let settings = &store.knowledge("coding-bot-01").unwrap().settings;
        assert!(settings.auto_index_enabled);
        assert_eq!(settings.chunk_size, 1000);
        assert_eq!(settings.chunk_overlap, 200);
    }

    app.form("/bots/coding-bot-01/knowledge/settings", "chunk_size=abc&chunk_overlap=1")
        .await;
    let page = app.get("/bots/coding-bot-01/config?tab=knowledge").await;
    assert!(page.body.contains("Chunk size must be a whole number"));
}

#[tokio::test]
async fn test_reindex_completes_in_background() {
    let app = test_app();
    let resp = app.form("/bots/coding-bot-01/knowledge/reindex", "").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let page = app.get("/bots/coding-bot-01/config?tab=knowledge").await;
    assert!(page.body.contains("Re-indexing completed successfully!"));
    let store = app.state.store.read().await;
    assert!(store
        .knowledge("coding-bot-01")
        .unwrap()
        .settings
        .last_reindex_date
        .is_some());
}

#[tokio::test]
async fn test_preview_actions_update_widget() {
    let app = test_app();
    let resp = app.form("/bots/coding-bot-01/preview?tab=appearance", "action=close").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(
        resp.location.as_deref(),
        Some("/bots/coding-bot-01/config?tab=appearance")
    );
    assert!(!app.state.previews.read().await["coding-bot-01"].chat_open);

    app.form("/bots/coding-bot-01/preview", "action=open").await;
    app.form("/bots/coding-bot-01/preview", "action=type&text=Hello").await;
    {
        let previews = app.state.previews.read().await;
        let widget = &previews["coding-bot-01"];
        assert!(widget.chat_open);
        assert_eq!(widget.chat_message, "Hello");
    }

    let resp = app.form("/bots/coding-bot-01/preview", "action=dance").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_voice_capture_fills_preview_input() {
    let app = test_app();
    app.form("/bots/coding-bot-01/preview", "action=voice").await;
    assert!(app.state.previews.read().await["coding-bot-01"].listening);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let previews = app.state.previews.read().await;
    let widget = &previews["coding-bot-01"];
    assert!(!widget.listening);
    assert_eq!(widget.chat_message, "What are your business hours?");
}

#[tokio::test]
async fn test_users_page_filters() {
    let app = test_app();
    let resp = app.get("/users?role=editor").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Jane Smith"));
    assert!(!resp.body.contains("John Doe"));

    let resp = app.get("/users?status=inactive").await;
    assert!(resp.body.contains("Mike Johnson"));
    assert!(!resp.body.contains("Jane Smith"));
}

#[tokio::test]
async fn test_create_user_with_picker() {
    let app = test_app();
    let base = "first_name=Ana&last_name=Lima&username=ana&email=ana%40example.com\
&password=pw&role=editor";

    // An assign click re-renders the dialog with the bot selected.
    let resp = app
        .form("/users", &format!("{base}&bots=&assign_bot=sales-assistant"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("name=\"bots\" value=\"sales-assistant\""));
    assert_eq!(app.state.store.read().await.users().len(), 3);

    // No bot selected yet.
    let resp = app.form("/users", &format!("{base}&bots=")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Please fill in all required fields"));

    let resp = app
        .form("/users", &format!("{base}&bots=sales-assistant%2Ccoding-bot-01"))
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    let store = app.state.store.read().await;
    let user = store.users().iter().find(|u| u.email == "ana@example.com").unwrap();
    assert_eq!(user.name, "Ana Lima");
    assert_eq!(user.role, UserRole::Editor);
    assert_eq!(user.assigned_bots, vec!["sales-assistant", "coding-bot-01"]);
}

#[tokio::test]
async fn test_edit_user_round_trip() {
    let app = test_app();
    let resp = app.get("/users/2/edit").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("value=\"Jane\""));
    assert!(resp.body.contains("value=\"Smith\""));

    let resp = app
        .form(
            "/users/2/edit",
            "first_name=Jane&last_name=Doe&username=jane.smith&email=jane.smith%40example.com\
&role=viewer&bots=coding-bot-01",
        )
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    let store = app.state.store.read().await;
    let user = store.user("2").unwrap();
    assert_eq!(user.name, "Jane Doe");
    assert_eq!(user.role, UserRole::Viewer);
    assert_eq!(user.status, UserStatus::Inactive);
    assert_eq!(user.assigned_bots, vec!["coding-bot-01"]);
}

#[tokio::test]
async fn test_edit_user_email_conflict() {
    let app = test_app();
    let resp = app
        .form(
            "/users/2/edit",
            "first_name=Jane&last_name=Smith&username=jane&email=john.doe%40example.com\
&role=editor&bots=coding-bot-01&active=true",
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("already exists"));
    assert_eq!(
        app.state.store.read().await.user("2").unwrap().email,
        "jane.smith@example.com"
    );
}

#[tokio::test]
async fn test_delete_user() {
    let app = test_app();
    let resp = app.form("/users/3/delete", "").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert!(app.state.store.read().await.user("3").is_err());

    let resp = app.form("/users/3/delete", "").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refused_page_actions_are_audited() {
    let app = test_app();
    let before = app.state.audit.metrics().rejected;

    let resp = app.form("/bots/ghost/toggle", "").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    let resp = app.form("/users/ghost/delete", "").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    app.form("/bots/coding-bot-01/urls", "url=").await;

    assert_eq!(app.state.audit.metrics().rejected, before + 3);
}
