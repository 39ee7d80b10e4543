//! Request routing. Handlers are synchronous and read the registry per request.

use std::path::PathBuf;

use serde_json::json;

use fluentpages_core::{
    registry, CapabilityPolicy, LayoutId, PageForm, PageId, RegistryError, Settings,
};
use fluentpages_templates::{describe_layout, FsLister, LookupError, TemplatePathField};

use crate::http::{Request, Response};

/// Immutable state shared by every connection.
#[derive(Debug, Clone)]
pub struct AppState {
    pub home: PathBuf,
    pub settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// `None` when the id has more digits than any stored id can.
    GetLayout(Option<LayoutId>),
    TemplateChoices,
    PageForm(Option<PageId>),
}

impl Route {
    fn parse(path: &str) -> Option<Self> {
        let trimmed = path.strip_prefix('/')?;
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let mut segments = trimmed.split('/');
        let route = match (segments.next(), segments.next()) {
            (Some("get_layout"), Some(id)) => Route::GetLayout(parse_id(id)?.map(LayoutId)),
            (Some("page_form"), Some(id)) => Route::PageForm(parse_id(id)?.map(PageId)),
            (Some("template_choices"), None) => Route::TemplateChoices,
            _ => return None,
        };
        segments.next().is_none().then_some(route)
    }
}

/// Decimal digits only; no sign, no whitespace. The inner `None` is an id
/// that overflows `u64`.
fn parse_id(raw: &str) -> Option<Option<u64>> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(raw.parse().ok())
}

pub fn handle(state: &AppState, request: &Request) -> Response {
    let Some(route) = Route::parse(&request.path) else {
        return Response::error(404, "Not found");
    };
    if request.method != "GET" {
        return Response::error(405, "Method not allowed");
    }

    match route {
        Route::GetLayout(Some(id)) => get_layout(state, id),
        Route::GetLayout(None) => Response::error(404, "Layout not found"),
        Route::TemplateChoices => template_choices(state),
        Route::PageForm(Some(id)) => page_form(state, id, request.param("user")),
        Route::PageForm(None) => Response::error(404, "Page not found"),
    }
}

fn get_layout(state: &AppState, id: LayoutId) -> Response {
    match describe_layout(&state.home, &state.settings, id) {
        Ok(info) => match serde_json::to_value(&info) {
            Ok(body) => Response::ok(body),
            Err(err) => internal("get_layout", err),
        },
        Err(LookupError::NotFound { .. }) => Response::error(404, "Layout not found"),
        Err(err) => internal("get_layout", err),
    }
}

fn template_choices(state: &AppState) -> Response {
    let choices = TemplatePathField::from_settings(&state.settings)
        .and_then(|field| field.choices(&FsLister));
    match choices {
        Ok(choices) => Response::ok(json!({
            "relative": state.settings.relative_mode(),
            "choices": choices,
        })),
        Err(err) => internal("template_choices", err),
    }
}

fn page_form(state: &AppState, id: PageId, user: Option<&str>) -> Response {
    let page = match registry::get_page_at(&state.home, id) {
        Ok(page) => page,
        Err(RegistryError::PageNotFound { .. }) => return Response::error(404, "Page not found"),
        Err(err) => return internal("page_form", err),
    };
    let layouts = match registry::list_layouts_at(&state.home) {
        Ok(layouts) => layouts,
        Err(err) => return internal("page_form", err),
    };
    let principal = state.settings.principal(user);
    let form = PageForm::build(&CapabilityPolicy, &principal, Some(&page), &layouts);
    match serde_json::to_value(&form) {
        Ok(body) => Response::ok(body),
        Err(err) => internal("page_form", err),
    }
}

fn internal(route: &str, err: impl std::fmt::Display) -> Response {
    tracing::error!(route, error = %err, "request failed");
    Response::error(500, err.to_string())
}
