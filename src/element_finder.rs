use regex::Regex;
use scraper::{ElementRef, Html};
use std::path::Path;
use std::sync::LazyLock;

use crate::models::CheckResult;
use crate::utils::error::Result;

static ADD_TO_CART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)add\s*to\s*cart").expect("add-to-cart pattern is valid"));

/// Class-name fragments that mark a purchase control as unusable.
pub const LOCKED_CLASS_MARKERS: [&str; 4] = ["disabled", "soldout", "locked", "unavailable"];

const FORM_CONTROLS: [&str; 6] = ["button", "input", "select", "textarea", "option", "optgroup"];

/// The small slice of DOM access the availability check needs.
///
/// Keeps [`evaluate_element`] independent of the HTML parser in use.
pub trait MarkupElement {
    /// Concatenated text content of the element and its descendants.
    fn text(&self) -> String;
    fn attribute(&self, name: &str) -> Option<&str>;
    /// Whether the element is in a UI state such as `disabled`.
    fn has_pseudo_state(&self, state: &str) -> bool;
}

impl<'a> MarkupElement for ElementRef<'a> {
    fn text(&self) -> String {
        ElementRef::text(self).collect()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn has_pseudo_state(&self, state: &str) -> bool {
        match state {
            "disabled" => {
                if self.value().attr("disabled").is_some() {
                    return true;
                }
                FORM_CONTROLS.contains(&self.value().name()) && inside_disabled_fieldset(*self)
            }
            _ => false,
        }
    }
}

/// Form controls inherit `disabled` from an enclosing disabled fieldset,
/// except inside that fieldset's first `<legend>`.
fn inside_disabled_fieldset(element: ElementRef<'_>) -> bool {
    let mut child = element;
    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        if ancestor.value().name() == "fieldset" && ancestor.value().attr("disabled").is_some() {
            let first_legend = ancestor
                .children()
                .filter_map(ElementRef::wrap)
                .find(|c| c.value().name() == "legend");
            if first_legend != Some(child) {
                return true;
            }
        }
        child = ancestor;
    }
    false
}

/// First element in document order whose `id` is exactly `id`.
pub fn find_by_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().id() == Some(id))
}

/// Parses `markup` and evaluates the element with the given id.
pub fn evaluate_availability(markup: &str, target_id: &str) -> CheckResult {
    let document = Html::parse_document(markup);
    evaluate_element(find_by_id(&document, target_id).as_ref())
}

/// Reads a saved page from disk and evaluates it.
pub async fn evaluate_file(path: impl AsRef<Path>, target_id: &str) -> Result<CheckResult> {
    let markup = tokio::fs::read_to_string(path).await?;
    Ok(evaluate_availability(&markup, target_id))
}

pub fn evaluate_element<E: MarkupElement>(element: Option<&E>) -> CheckResult {
    let Some(element) = element else {
        return CheckResult::missing();
    };

    let text = element.text().trim().to_string();
    let says_add_to_cart = says_add_to_cart(&text);
    let locked = is_locked(element);

    CheckResult {
        exists: true,
        text,
        says_add_to_cart,
        locked,
    }
}

pub fn says_add_to_cart(text: &str) -> bool {
    ADD_TO_CART.is_match(text)
}

fn is_locked<E: MarkupElement>(element: &E) -> bool {
    if element.has_pseudo_state("disabled") {
        return true;
    }

    if attribute_is_true(element, "aria-disabled") || attribute_is_true(element, "data-locked") {
        return true;
    }

    element
        .attribute("class")
        .map(|class| {
            let class = class.to_ascii_lowercase();
            LOCKED_CLASS_MARKERS.iter().any(|marker| class.contains(marker))
        })
        .unwrap_or(false)
}

fn attribute_is_true<E: MarkupElement>(element: &E, name: &str) -> bool {
    element
        .attribute(name)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
