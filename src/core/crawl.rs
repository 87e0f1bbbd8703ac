// src/core/crawl.rs

//! Link, form and parameter extraction from a single fetched page.

use crate::core::models::{PageExtract, Parameter};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::form_urlencoded;

static LINK_OR_FORM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a, form").expect("static selector is valid"));
static FORM: Lazy<Selector> = Lazy::new(|| Selector::parse("form").expect("static selector is valid"));
static FORM_FIELD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, textarea").expect("static selector is valid"));

/// Extracts in-scope links, query parameters and form fields from `html`.
///
/// `page_url` is the URL the body was fetched from; relative links are joined
/// to its scheme and authority exactly as written there. Absolute links survive only if they contain
/// `target_domain` somewhere in their text.
pub fn extract_page(html: &str, page_url: &str, target_domain: &str) -> PageExtract {
    let document = Html::parse_document(html);
    let base = origin_of(page_url);
    let mut extract = PageExtract::default();

    for element in document.select(&LINK_OR_FORM) {
        let Some(href) = non_empty_attr(&element, "href").or_else(|| non_empty_attr(&element, "action")) else {
            continue;
        };
        let Some(full_url) = resolve_link(href, base, target_domain) else {
            debug!(href, "Dropping out-of-scope link.");
            continue;
        };
        extract.parameters.extend(query_parameters(&full_url));
        extract.urls.push(full_url);
    }

    for form in document.select(&FORM) {
        let action = non_empty_attr(&form, "action").unwrap_or(page_url);
        let form_url = resolve_form_action(action, base);
        let method = form.value().attr("method").unwrap_or("get").to_uppercase();

        for field in form.select(&FORM_FIELD) {
            let Some(name) = non_empty_attr(&field, "name") else {
                continue;
            };
            extract.parameters.push(Parameter::FormField {
                url: form_url.clone(),
                parameter: name.to_string(),
                input_type: field.value().attr("type").unwrap_or("text").to_string(),
                method: method.clone(),
            });
        }
    }

    debug!(
        page = page_url,
        urls = extract.urls.len(),
        parameters = extract.parameters.len(),
        "Page extraction finished."
    );
    extract
}

/// Resolves an anchor `href` (or form `action`) against the page origin.
/// Returns `None` for absolute links that do not mention the target domain.
pub fn resolve_link(href: &str, base: &str, target_domain: &str) -> Option<String> {
    if href.starts_with('/') {
        Some(format!("{base}{href}"))
    } else if is_absolute(href) {
        href.contains(target_domain).then(|| href.to_string())
    } else {
        Some(format!("{base}/{href}"))
    }
}

fn resolve_form_action(action: &str, base: &str) -> String {
    if is_absolute(action) {
        action.to_string()
    } else if action.starts_with('/') {
        format!("{base}{action}")
    } else {
        format!("{base}/{action}")
    }
}

/// One entry per distinct query key, keyed on its first non-blank value.
fn query_parameters(full_url: &str) -> Vec<Parameter> {
    let Some((_, rest)) = full_url.split_once('?') else {
        return Vec::new();
    };
    let query = rest.split('#').next().unwrap_or_default();

    let mut seen = HashSet::new();
    form_urlencoded::parse(query.as_bytes())
        .filter(|(_, value)| !value.is_empty())
        .filter(|(key, _)| seen.insert(key.to_string()))
        .map(|(key, value)| Parameter::Query {
            url: full_url.to_string(),
            parameter: key.into_owned(),
            example_value: value.into_owned(),
        })
        .collect()
}

/// `scheme://authority` of the page, used as the join base for relative links.
/// The host is not normalized: case, port and IDN form stay as the caller wrote them.
fn origin_of(page_url: &str) -> &str {
    let authority = page_url.find("://").map_or(0, |i| i + 3);
    let end = page_url[authority..]
        .find(['/', '?', '#'])
        .map_or(page_url.len(), |i| authority + i);
    &page_url[..end]
}

fn is_absolute(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}

fn non_empty_attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|v| !v.is_empty())
}
