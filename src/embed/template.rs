//! Embedded text with named placeholders.

use std::marker::PhantomData;

/// Values for a [`Template`]'s placeholders, as `(placeholder, value)` pairs.
///
/// Pairs are substituted in order, so a value that itself contains a later
/// placeholder is expanded again. Put raw payloads (module code, messages)
/// last.
pub trait TemplateVars {
    fn bindings(&self) -> Vec<(&'static str, String)>;
}

#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _vars: PhantomData<fn(&V)>,
}

impl<V: TemplateVars> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _vars: PhantomData,
        }
    }

    pub fn render(&self, vars: &V) -> String {
        vars.bindings()
            .into_iter()
            .fold(self.content.to_string(), |out, (placeholder, value)| {
                debug_assert!(out.contains(placeholder), "{placeholder} not in template");
                out.replace(placeholder, &value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeting {
        name: &'static str,
        body: &'static str,
    }

    impl TemplateVars for Greeting {
        fn bindings(&self) -> Vec<(&'static str, String)> {
            vec![("{{name}}", self.name.into()), ("{{body}}", self.body.into())]
        }
    }

    #[test]
    fn test_render_in_binding_order() {
        const TEMPLATE: Template<Greeting> = Template::new("<{{name}}>{{body}}</{{name}}>");
        let out = TEMPLATE.render(&Greeting {
            name: "p",
            body: "{{name}}",
        });
        // the body is substituted after the name, so it stays literal
        assert_eq!(out, "<p>{{name}}</p>");
    }
}
