//! Contact repository port: read access to CRM contacts.

use std::future::Future;

use crmflow_domain::contact::Contact;
use crmflow_domain::error::CrmFlowError;
use crmflow_domain::id::ContactId;

/// Which contacts to load before group resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFilter {
    All,
    Only(ContactId),
}

/// Source of the contacts automations act upon.
///
/// Contacts are owned by the surrounding CRM; the engine only reads them
/// and appends audit notes.
pub trait ContactRepository {
    /// List contacts matching `filter`, in storage order.
    fn list(
        &self,
        filter: ContactFilter,
    ) -> impl Future<Output = Result<Vec<Contact>, CrmFlowError>> + Send;

    /// Append a free-text note to a contact.
    fn append_note(
        &self,
        id: ContactId,
        note: String,
    ) -> impl Future<Output = Result<(), CrmFlowError>> + Send;
}

impl<T: ContactRepository + Send + Sync> ContactRepository for std::sync::Arc<T> {
    fn list(
        &self,
        filter: ContactFilter,
    ) -> impl Future<Output = Result<Vec<Contact>, CrmFlowError>> + Send {
        (**self).list(filter)
    }

    fn append_note(
        &self,
        id: ContactId,
        note: String,
    ) -> impl Future<Output = Result<(), CrmFlowError>> + Send {
        (**self).append_note(id, note)
    }
}
