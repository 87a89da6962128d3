//! Identity Event Listener
//!
//! Bus-facing adapter: the message-bus consumer hands tenant-tagged
//! identity events to [`IdentityEventListener::on_event`], which routes
//! them into the expectation registry. The provisioning clients use the
//! `expect_*` helpers to register interest before issuing the call that
//! produces the event.

use serde::{Deserialize, Serialize};

use crate::registry::{EventExpectation, EventKey, EventRegistry};

/// Acknowledgment for a permittable group registered with identity
pub const OPERATION_PERMITTABLE_GROUP_CREATED: &str = "permittable-group-created";

/// Acknowledgment for an application signature stored by identity
pub const OPERATION_APPLICATION_SIGNATURE_SET: &str = "application-signature-set";

/// Payload of an application-signature acknowledgment
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationSignatureEvent {
    pub application: String,
    pub timestamp: String,
}

impl ApplicationSignatureEvent {
    fn correlation(&self) -> String {
        format!("{}:{}", self.application, self.timestamp)
    }
}

/// Routes identity acknowledgments into the expectation registry
#[derive(Clone, Default)]
pub struct IdentityEventListener {
    registry: EventRegistry,
}

impl IdentityEventListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry point for the message-bus consumer
    pub fn on_event(&self, tenant_identifier: &str, event_type: &str, payload: &str) {
        match event_type {
            OPERATION_PERMITTABLE_GROUP_CREATED => {
                self.on_permittable_group_created(tenant_identifier, payload)
            }
            OPERATION_APPLICATION_SIGNATURE_SET => {
                self.on_application_signature_set(tenant_identifier, payload)
            }
            other => {
                tracing::debug!(tenant = tenant_identifier, event_type = other, "unhandled event type")
            }
        }
    }

    /// Payload is the bare group identifier
    pub fn on_permittable_group_created(&self, tenant_identifier: &str, group_identifier: &str) {
        self.registry.notify(&EventKey::new(
            tenant_identifier,
            OPERATION_PERMITTABLE_GROUP_CREATED,
            group_identifier,
        ));
    }

    /// Payload is a JSON [`ApplicationSignatureEvent`]
    pub fn on_application_signature_set(&self, tenant_identifier: &str, payload: &str) {
        match serde_json::from_str::<ApplicationSignatureEvent>(payload) {
            Ok(event) => self.registry.notify(&EventKey::new(
                tenant_identifier,
                OPERATION_APPLICATION_SIGNATURE_SET,
                event.correlation(),
            )),
            Err(e) => tracing::warn!(
                tenant = tenant_identifier,
                error = %e,
                "undecodable application-signature event"
            ),
        }
    }

    pub fn expect_permittable_group_created(
        &self,
        tenant_identifier: &str,
        group_identifier: &str,
    ) -> EventExpectation {
        self.registry.expect(EventKey::new(
            tenant_identifier,
            OPERATION_PERMITTABLE_GROUP_CREATED,
            group_identifier,
        ))
    }

    pub fn expect_application_signature_set(
        &self,
        tenant_identifier: &str,
        application_name: &str,
        key_timestamp: &str,
    ) -> EventExpectation {
        let event = ApplicationSignatureEvent {
            application: application_name.to_string(),
            timestamp: key_timestamp.to_string(),
        };
        self.registry.expect(EventKey::new(
            tenant_identifier,
            OPERATION_APPLICATION_SIGNATURE_SET,
            event.correlation(),
        ))
    }

    pub fn withdraw(&self, expectation: &EventExpectation) {
        self.registry.withdraw(expectation);
    }
}
