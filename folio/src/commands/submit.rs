use anyhow::Context;
use clap::Args;
use folio_config::Config;
use folio_form::{
    ContactApiServiceImpl, ContactField, ContactForm, ContactFormConfig, FormState, SubmitError,
};
use url::Url;

/// Contact form fields, sent like the website does it
#[derive(Debug, Args)]
pub struct SubmitCommand {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    message: String,
    /// Url of the contact endpoint [default: form.endpoint from the config]
    #[arg(long)]
    endpoint: Option<Url>,
}

impl SubmitCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        let endpoint = self.endpoint.unwrap_or(config.form.endpoint);
        let api = ContactApiServiceImpl::new(endpoint).context("Failed to create http client")?;
        let form = ContactForm::new(
            api,
            ContactFormConfig {
                reset_delay: config.form.reset_delay.into(),
            },
        );

        form.open();
        form.set_field(ContactField::Name, self.name);
        form.set_field(ContactField::Email, self.email);
        form.set_field(ContactField::Company, self.company.unwrap_or_default());
        form.set_field(ContactField::Message, self.message);

        match form.submit().await {
            Ok(()) => {
                println!("Message sent!");
                Ok(())
            }
            Err(SubmitError::Failed(err)) => {
                let view = form.view();
                if let FormState::Error(message) = view.state {
                    eprintln!("{message}");
                }
                Err(err).context("Failed to submit the contact form")
            }
            Err(err) => Err(err.into()),
        }
    }
}
