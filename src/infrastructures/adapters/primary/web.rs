use crate::application::use_cases::fetch_repository_issues::{
    FetchRepositoryIssuesInteractor, FetchRepositoryIssuesUseCase,
    FetchRepositoryIssuesUseCaseInput, FetchRepositoryIssuesUseCaseOutput,
};
use crate::domain::models::issue::{GraphqlError, Organization, Repository};
use crate::infrastructures::adapters::secondary::external_apis::github::GitHubGraphqlAdapter;
use axum::{
    Router,
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

const TITLE: &str = "GitHub GraphQL Issues Dashboard";
const PLACEHOLDER: &str = "No information yet...";

/// Pre-filled path shown before the user submits anything.
pub const DEFAULT_PATH: &str = "the-road-to-learn-react/the-road-to-learn-react";

/// The view model behind the page. Replaced wholesale per fetch, never
/// patched field by field, so a response either lands completely or not at
/// all. Concurrent submits resolve in arrival order; the last arrival wins.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub path: String,
    pub organization: Option<Organization>,
    pub errors: Option<Vec<GraphqlError>>,
}

impl DashboardState {
    pub fn new(path: String) -> Self {
        Self {
            path,
            organization: None,
            errors: None,
        }
    }

    pub fn apply(&mut self, path: String, output: FetchRepositoryIssuesUseCaseOutput) {
        *self = Self {
            path,
            organization: output.organization,
            errors: output.errors,
        };
    }
}

pub struct AppState {
    pub use_case: Arc<FetchRepositoryIssuesInteractor<GitHubGraphqlAdapter>>,
    pub dashboard: RwLock<DashboardState>,
}

#[derive(Deserialize, Debug)]
pub struct SearchForm {
    pub path: String,
}

#[axum::debug_handler]
async fn dashboard(State(state): State<Arc<AppState>>) -> Html<String> {
    let dashboard = state.dashboard.read().await;
    Html(render_page(&dashboard))
}

#[axum::debug_handler]
#[tracing::instrument(name = "search", skip(state, form), fields(path = %form.path))]
async fn search(State(state): State<Arc<AppState>>, Form(form): Form<SearchForm>) -> Html<String> {
    let input = FetchRepositoryIssuesUseCaseInput {
        path: form.path.clone(),
    };
    match state.use_case.execute(input).await {
        Ok(output) => {
            let mut dashboard = state.dashboard.write().await;
            dashboard.apply(form.path, output);
            Html(render_page(&dashboard))
        }
        Err(e) => {
            // Transport-level failure: nothing is promised to the user, the
            // page keeps its pre-submit state.
            tracing::error!("Fetch for {} failed: {:?}", form.path, e);
            let dashboard = state.dashboard.read().await;
            Html(render_page(&dashboard))
        }
    }
}

#[tracing::instrument(name = "health_check")]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard).post(search))
        .route("/health", get(health_check))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The exact message-area text for a GraphQL error list: messages joined by
/// a single space, in array order. An empty list still produces the prefix.
pub fn error_message(errors: &[GraphqlError]) -> String {
    let joined = errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    format!("Something went wrong: {joined}")
}

fn render_repository(repository: Option<&Repository>) -> String {
    // An organization without the queried repository still gets its section
    // rendered, with empty link text and href.
    let name = repository.map_or("", |repository| repository.name.as_str());
    let url = repository.map_or("", |repository| repository.url.as_str());
    let items: String = repository
        .map(|repository| {
            repository
                .issues
                .edges
                .iter()
                .map(|edge| format!("<li>{}</li>", escape(&edge.node.title)))
                .collect()
        })
        .unwrap_or_default();
    format!(
        "<div><p><strong>In Repository:</strong> <a href=\"{}\">{}</a></p><ul>{}</ul></div>",
        escape(url),
        escape(name),
        items
    )
}

fn render_organization(organization: &Organization) -> String {
    format!(
        "<div><p><strong>Issues from Organization:</strong> <a href=\"{}\">{}</a></p>{}</div>",
        escape(&organization.url),
        escape(&organization.name),
        render_repository(organization.repository.as_ref())
    )
}

/// The result area below the form. Errors take precedence over data even
/// when both arrived in the same envelope; before the first response there
/// is only the placeholder.
pub fn render_result(state: &DashboardState) -> String {
    if let Some(errors) = &state.errors {
        format!("<p><strong>{}</strong></p>", escape(&error_message(errors)))
    } else if let Some(organization) = &state.organization {
        render_organization(organization)
    } else {
        format!("<p>{PLACEHOLDER}</p>")
    }
}

pub fn render_page(state: &DashboardState) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{TITLE}</title></head>
<body>
<h1>{TITLE}</h1>
<form method="post" action="/">
<label for="url">Show open issues for https://github.com/</label>
<input id="url" name="path" type="text" value="{path}" style="width: 300px">
<button type="submit">Search</button>
</form>
<hr>
{result}
</body>
</html>
"#,
        path = escape(&state.path),
        result = render_result(state)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::fetch_repository_issues::resolve;
    use crate::domain::external_apis::github::QueryEnvelope;
    use serde_json::json;

    fn state_from_envelope(value: serde_json::Value) -> DashboardState {
        let envelope: QueryEnvelope = serde_json::from_value(value).unwrap();
        let mut state = DashboardState::new(DEFAULT_PATH.to_string());
        state.apply(DEFAULT_PATH.to_string(), resolve(envelope));
        state
    }

    #[test]
    fn initial_state_renders_the_placeholder() {
        let state = DashboardState::new(DEFAULT_PATH.to_string());
        assert_eq!(render_result(&state), "<p>No information yet...</p>");
    }

    #[test]
    fn error_messages_are_space_joined_in_order() {
        let errors = vec![
            GraphqlError {
                message: "first".to_string(),
            },
            GraphqlError {
                message: "second".to_string(),
            },
            GraphqlError {
                message: "third".to_string(),
            },
        ];
        assert_eq!(error_message(&errors), "Something went wrong: first second third");
    }

    #[test]
    fn not_found_error_renders_verbatim() {
        let state = state_from_envelope(json!({ "errors": [{ "message": "Not Found" }] }));
        assert_eq!(
            error_message(state.errors.as_deref().unwrap()),
            "Something went wrong: Not Found"
        );
        let result = render_result(&state);
        assert!(result.contains("Something went wrong: Not Found"));
        assert!(!result.contains("<ul>"));
    }

    #[test]
    fn empty_error_list_still_selects_the_error_view() {
        let state = state_from_envelope(json!({
            "data": { "organization": { "name": "X", "url": "u", "repository": null } },
            "errors": []
        }));
        assert_eq!(
            render_result(&state),
            "<p><strong>Something went wrong: </strong></p>"
        );
    }

    #[test]
    fn single_issue_renders_a_single_list_item() {
        let state = state_from_envelope(json!({
            "data": {
                "organization": {
                    "name": "X",
                    "url": "u",
                    "repository": {
                        "name": "R",
                        "url": "ru",
                        "issues": { "edges": [
                            { "node": { "id": "1", "title": "Bug A", "url": "a" } }
                        ] }
                    }
                }
            }
        }));

        let result = render_result(&state);
        assert!(result.contains("<li>Bug A</li>"));
        assert_eq!(result.matches("<li>").count(), 1);
        assert!(result.contains(">X</a>"));
        assert!(result.contains(">R</a>"));
    }

    #[test]
    fn issues_render_in_api_order() {
        let state = state_from_envelope(json!({
            "data": {
                "organization": {
                    "name": "X",
                    "url": "u",
                    "repository": {
                        "name": "R",
                        "url": "ru",
                        "issues": { "edges": [
                            { "node": { "id": "1", "title": "oldest", "url": "a" } },
                            { "node": { "id": "2", "title": "newest", "url": "b" } }
                        ] }
                    }
                }
            }
        }));

        let result = render_result(&state);
        let oldest = result.find("<li>oldest</li>").unwrap();
        let newest = result.find("<li>newest</li>").unwrap();
        assert!(oldest < newest);
    }

    #[test]
    fn missing_repository_renders_an_empty_section() {
        let state = state_from_envelope(json!({
            "data": { "organization": { "name": "X", "url": "u", "repository": null } }
        }));

        let result = render_result(&state);
        assert!(result.contains("In Repository:"));
        assert!(result.contains("<a href=\"\"></a>"));
        assert!(result.contains("<ul></ul>"));
    }

    #[test]
    fn apply_replaces_the_state_wholesale() {
        let mut state = state_from_envelope(json!({ "errors": [{ "message": "Not Found" }] }));
        assert!(state.errors.is_some());

        let envelope: QueryEnvelope = serde_json::from_value(json!({
            "data": { "organization": { "name": "X", "url": "u", "repository": null } }
        }))
        .unwrap();
        state.apply("facebook/react".to_string(), resolve(envelope));

        assert_eq!(state.path, "facebook/react");
        assert!(state.errors.is_none());
        assert_eq!(state.organization.unwrap().name, "X");
    }

    #[test]
    fn page_escapes_user_supplied_path() {
        let state = DashboardState::new("\"><script>alert(1)</script>".to_string());
        let page = render_page(&state);
        assert!(!page.contains("<script>"));
        assert!(page.contains("&quot;&gt;&lt;script&gt;"));
    }

    #[test]
    fn page_contains_the_form_and_current_path() {
        let state = DashboardState::new(DEFAULT_PATH.to_string());
        let page = render_page(&state);
        assert!(page.contains("Show open issues for https://github.com/"));
        assert!(page.contains(&format!("value=\"{DEFAULT_PATH}\"")));
        assert!(page.contains("<button type=\"submit\">Search</button>"));
    }
}
