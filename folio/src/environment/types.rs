use folio_core_contact_impl::ContactFeatureServiceImpl;
use folio_core_health_impl::HealthFeatureServiceImpl;
use folio_email_impl::EmailServiceImpl;
use folio_templates_impl::TemplateServiceImpl;

// API
pub type RestServer = folio_api_rest::RestServer<HealthFeature, ContactFeature>;

// Email
pub type Email = EmailServiceImpl;

// Templates
pub type Template = TemplateServiceImpl;

// Core
pub type ContactFeature = ContactFeatureServiceImpl<Email, Template>;
pub type HealthFeature = HealthFeatureServiceImpl<Email>;
