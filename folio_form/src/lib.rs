//! Client side of the contact form: field state, the submission flow and the
//! user facing outcome.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

pub use api::{user_agent, ContactApiError, ContactApiService, ContactApiServiceImpl};

mod api;

/// Shown to the visitor when a submission could not be delivered.
pub const SUBMIT_ERROR_MESSAGE: &str = "Could not send message, please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Email,
    Company,
    Message,
}

impl ContactField {
    pub const REQUIRED: [Self; 3] = [Self::Name, Self::Email, Self::Message];
}

impl std::fmt::Display for ContactField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Company => "company",
            Self::Message => "message",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactFormFields {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub company: String,
    pub message: String,
}

impl ContactFormFields {
    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Company => &self.company,
            ContactField::Message => &self.message,
        }
    }

    fn get_mut(&mut self, field: ContactField) -> &mut String {
        match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Company => &mut self.company,
            ContactField::Message => &mut self.message,
        }
    }

    /// Required fields that are empty or only contain whitespace.
    pub fn missing(&self) -> Vec<ContactField> {
        ContactField::REQUIRED
            .into_iter()
            .filter(|&field| self.get(field).trim().is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Idle,
    Sending,
    Success,
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFormView {
    pub state: FormState,
    pub fields: ContactFormFields,
    pub open: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ContactFormConfig {
    /// Time between a successful submission and the form being reset.
    pub reset_delay: Duration,
}

impl Default for ContactFormConfig {
    fn default() -> Self {
        Self {
            reset_delay: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A submission is already in progress.")]
    AlreadySending,
    #[error("Required fields are empty: {}.", display_fields(.0))]
    Incomplete(Vec<ContactField>),
    #[error("Could not send the message.")]
    Failed(#[source] ContactApiError),
}

fn display_fields(fields: &[ContactField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// State of a single contact form.
///
/// Every change is published to the receivers returned by
/// [`ContactForm::subscribe`].
#[derive(Debug)]
pub struct ContactForm<Api> {
    api: Api,
    config: ContactFormConfig,
    view: Arc<watch::Sender<ContactFormView>>,
    /// Number of submissions that have been sent so far.
    generation: Arc<AtomicU64>,
}

impl<Api: ContactApiService> ContactForm<Api> {
    pub fn new(api: Api, config: ContactFormConfig) -> Self {
        let (view, _) = watch::channel(ContactFormView::default());
        Self {
            api,
            config,
            view: view.into(),
            generation: Default::default(),
        }
    }

    pub fn view(&self) -> ContactFormView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ContactFormView> {
        self.view.subscribe()
    }

    pub fn open(&self) {
        self.view.send_modify(|view| view.open = true);
    }

    pub fn close(&self) {
        self.view.send_modify(|view| view.open = false);
    }

    pub fn set_field(&self, field: ContactField, value: impl Into<String>) {
        let value = value.into();
        self.view.send_if_modified(|view| {
            let current = view.fields.get_mut(field);
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Submit the current fields.
    ///
    /// Nothing is sent while another submission is in flight or while a
    /// required field is empty. After a successful submission the form is
    /// closed and cleared once the reset delay has elapsed.
    pub async fn submit(&self) -> Result<(), SubmitError> {
        let mut fields = Err(SubmitError::AlreadySending);
        let mut generation = 0;
        self.view.send_if_modified(|view| {
            if view.state == FormState::Sending {
                return false;
            }

            let missing = view.fields.missing();
            if !missing.is_empty() {
                fields = Err(SubmitError::Incomplete(missing));
                return false;
            }

            view.state = FormState::Sending;
            fields = Ok(view.fields.clone());
            generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
            true
        });
        let fields = fields?;

        match self.api.submit(fields).await {
            Ok(()) => {
                info!("Sent contact message");
                self.view.send_modify(|view| view.state = FormState::Success);
                self.schedule_reset(generation);
                Ok(())
            }
            Err(err) => {
                warn!("Failed to send contact message: {err}");
                self.view.send_modify(|view| {
                    view.state = FormState::Error(SUBMIT_ERROR_MESSAGE.into())
                });
                Err(SubmitError::Failed(err))
            }
        }
    }

    fn schedule_reset(&self, generation: u64) {
        let view = Arc::clone(&self.view);
        let current = Arc::clone(&self.generation);
        let delay = self.config.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // a newer submission owns the form now
            view.send_if_modified(|view| {
                if current.load(Ordering::Relaxed) != generation
                    || view.state != FormState::Success
                {
                    return false;
                }
                *view = ContactFormView::default();
                true
            });
        });
    }
}
