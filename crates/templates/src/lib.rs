//! Per-category message templates.
//!
//! Each [`NotificationCategory`] maps to a template string with `{field}`
//! placeholders. Templates are resolved at enqueue time - the rendered body
//! is what gets persisted, so editing a template never mutates messages
//! already in the queue.
//!
//! Fields referenced by a template but missing from the field map render as
//! a visible `[missing <field>]` marker instead of failing, so incomplete
//! subscriber data shows up in the message rather than silently dropping the
//! notification.

use std::collections::HashMap;

use notify_core::NotificationCategory;
use thiserror::Error;

mod builtin;

/// Errors from template lookup and rendering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// No template registered for the category.
    #[error("no template registered for category: {0}")]
    TemplateNotFound(String),
}

/// Field map passed to [`TemplateRenderer::render`].
pub type Fields = HashMap<String, String>;

/// Template table: built-in defaults, optionally overridden per category.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    templates: HashMap<NotificationCategory, String>,
}

impl TemplateRenderer {
    /// Renderer seeded with the built-in templates for every category.
    pub fn with_builtins() -> Self {
        let mut templates = HashMap::new();
        for category in NotificationCategory::ALL {
            templates.insert(category, builtin::template_for(category).to_string());
        }
        Self { templates }
    }

    /// Renderer with no templates at all. Used by tests and by operators who
    /// manage every template themselves.
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Register or replace the template for a category.
    pub fn set_template(&mut self, category: NotificationCategory, template: impl Into<String>) {
        self.templates.insert(category, template.into());
    }

    /// Remove a category's template.
    pub fn remove_template(&mut self, category: NotificationCategory) -> Option<String> {
        self.templates.remove(&category)
    }

    /// The raw template registered for a category, if any.
    pub fn template(&self, category: NotificationCategory) -> Option<&str> {
        self.templates.get(&category).map(String::as_str)
    }

    /// Render the category's template with the given fields.
    pub fn render(
        &self,
        category: NotificationCategory,
        fields: &Fields,
    ) -> Result<String, TemplateError> {
        let template = self
            .templates
            .get(&category)
            .ok_or_else(|| TemplateError::TemplateNotFound(category.to_string()))?;
        Ok(substitute(template, fields))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Replace each `{field}` occurrence with its value, or a `[missing <field>]`
/// marker when the field is absent. Braces with no matching close, or empty
/// `{}`, pass through literally.
fn substitute(template: &str, fields: &Fields) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) if close > 0 => {
                let key = &after_open[..close];
                match fields.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("[missing ");
                        out.push_str(key);
                        out.push(']');
                    }
                }
                rest = &after_open[close + 1..];
            }
            _ => {
                // Unclosed or empty braces are literal text.
                out.push('{');
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_builtin_due_today() {
        let renderer = TemplateRenderer::with_builtins();
        let body = renderer
            .render(
                NotificationCategory::DueToday,
                &fields(&[
                    ("name", "Carlos"),
                    ("due_date", "24/08/2026"),
                    ("server", "fast play"),
                    ("price", "45.00"),
                    ("package", "1 mês"),
                    ("pix_key", "chave-pix"),
                    ("company", "Genial TV"),
                    ("contact", "(11) 4002-8922"),
                ]),
            )
            .unwrap();
        assert!(body.contains("Carlos"));
        assert!(body.contains("VENCE HOJE"));
        assert!(body.contains("chave-pix"));
        assert!(!body.contains("[missing"));
    }

    #[test]
    fn missing_fields_render_as_markers() {
        let renderer = TemplateRenderer::with_builtins();
        let body = renderer
            .render(
                NotificationCategory::Promotional,
                &Fields::new(),
            )
            .unwrap();
        assert!(body.contains("[missing name]"));
    }

    #[test]
    fn custom_category_passes_message_through() {
        let renderer = TemplateRenderer::with_builtins();
        let body = renderer
            .render(
                NotificationCategory::Custom,
                &fields(&[("message", "Oi, tudo bem?")]),
            )
            .unwrap();
        assert_eq!(body, "Oi, tudo bem?");
    }

    #[test]
    fn operator_override_replaces_builtin() {
        let mut renderer = TemplateRenderer::with_builtins();
        renderer.set_template(NotificationCategory::Welcome, "Bem-vindo, {name}!");
        let body = renderer
            .render(NotificationCategory::Welcome, &fields(&[("name", "Ana")]))
            .unwrap();
        assert_eq!(body, "Bem-vindo, Ana!");
    }

    #[test]
    fn unregistered_category_is_not_found() {
        let mut renderer = TemplateRenderer::with_builtins();
        renderer.remove_template(NotificationCategory::Billing);
        let err = renderer
            .render(NotificationCategory::Billing, &Fields::new())
            .unwrap_err();
        assert_eq!(err, TemplateError::TemplateNotFound("billing".to_string()));
    }

    #[test]
    fn empty_renderer_has_no_templates() {
        let renderer = TemplateRenderer::empty();
        assert!(renderer
            .render(NotificationCategory::DueToday, &Fields::new())
            .is_err());
    }

    #[test]
    fn substitute_handles_literal_braces() {
        let f = fields(&[("a", "x")]);
        assert_eq!(substitute("{a} and {unclosed", &f), "x and {unclosed");
        assert_eq!(substitute("empty {} stays", &f), "empty {} stays");
        assert_eq!(substitute("{a}{a}", &f), "xx");
    }

    #[test]
    fn every_category_has_a_builtin() {
        let renderer = TemplateRenderer::with_builtins();
        for category in NotificationCategory::ALL {
            assert!(
                renderer.template(category).is_some(),
                "missing builtin for {}",
                category
            );
        }
    }
}
