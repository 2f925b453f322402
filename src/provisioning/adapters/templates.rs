//! `minijinja` adapter rendering the SQL templates embedded in the crate.

use crate::provisioning::{
    domain::{ScriptContext, SqlTemplate},
    ports::{TemplateRenderError, TemplateRenderResult, TemplateRenderer},
};
use crate::shell::sql_literal;
use minijinja::{Environment, UndefinedBehavior};
use std::collections::BTreeMap;

/// Template renderer backed by a `minijinja` environment.
///
/// Templates are compiled into the binary. Missing context variables are
/// rendering errors rather than empty strings.
#[derive(Debug)]
pub struct MiniJinjaTemplates {
    environment: Environment<'static>,
}

impl MiniJinjaTemplates {
    /// Creates a renderer holding every [`SqlTemplate`].
    ///
    /// # Errors
    ///
    /// Returns [`TemplateRenderError::Render`] when an embedded template fails
    /// to compile.
    pub fn new() -> TemplateRenderResult<Self> {
        let mut environment = Environment::new();
        environment.set_undefined_behavior(UndefinedBehavior::Strict);
        environment.add_filter("sql_literal", sql_literal);

        for template in SqlTemplate::ALL {
            environment
                .add_template(template.file_name(), embedded_source(template))
                .map_err(|error| TemplateRenderError::Render {
                    template,
                    reason: error.to_string(),
                })?;
        }

        Ok(Self { environment })
    }
}

impl TemplateRenderer for MiniJinjaTemplates {
    fn render(
        &self,
        template: SqlTemplate,
        context: &ScriptContext,
    ) -> TemplateRenderResult<String> {
        let compiled = self
            .environment
            .get_template(template.file_name())
            .map_err(|_| TemplateRenderError::UnknownTemplate(template))?;
        let variables: BTreeMap<&str, &str> = context.iter().collect();
        compiled
            .render(variables)
            .map_err(|error| TemplateRenderError::Render {
                template,
                reason: error.to_string(),
            })
    }
}

const fn embedded_source(template: SqlTemplate) -> &'static str {
    match template {
        SqlTemplate::CheckUserExists => include_str!("../templates/check_user_exists.sql.jinja"),
        SqlTemplate::SetUserPassword => include_str!("../templates/set_user_password.sql.jinja"),
        SqlTemplate::RenameDatabaseAndOwner => {
            include_str!("../templates/rename_database_and_owner.sql.jinja")
        }
        SqlTemplate::RemoveInstance => include_str!("../templates/remove_instance.sql.jinja"),
        SqlTemplate::RenameInstance => include_str!("../templates/rename_instance.sql.jinja"),
    }
}
