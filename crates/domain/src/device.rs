//! Device: a sensor owned by a user, described by its capability tags.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{HomeMonitorError, ValidationError};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// Capability advertised by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Temperature,
    Humidity,
    Altitude,
    Pressure,
    Camera,
    Motion,
    Proximity,
}

/// A sensor registered by its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DeviceId>,
    pub owner: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub types: BTreeSet<DeviceType>,
    #[serde(default, with = "crate::time::wire::option")]
    pub created: Option<Timestamp>,
    #[serde(default, with = "crate::time::wire::option")]
    pub updated: Option<Timestamp>,
}

impl Device {
    pub const ID: &'static str = "id";
    pub const OWNER: &'static str = "owner";
    pub const CREATED: &'static str = "created";
    pub const UPDATED: &'static str = "updated";

    /// Fields the store should index for this collection.
    pub const INDEXED: [&'static str; 3] = [Self::OWNER, Self::CREATED, Self::UPDATED];

    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] when `owner` is empty.
    pub fn validate(&self) -> Result<(), HomeMonitorError> {
        if self.owner.trim().is_empty() {
            return Err(ValidationError::EmptyOwner.into());
        }
        Ok(())
    }

    /// Record a mutation at `now`.
    ///
    /// `created` is only set the first time, `updated` every time.
    pub fn stamp(&mut self, now: Timestamp) {
        self.created.get_or_insert(now);
        self.updated = Some(now);
    }
}

impl Document for Device {
    type Id = DeviceId;

    const COLLECTION: &'static str = "Device";

    fn id(&self) -> Option<DeviceId> {
        self.id
    }

    fn set_id(&mut self, id: DeviceId) {
        self.id = Some(id);
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    owner: Option<String>,
    description: Option<String>,
    location: Option<String>,
    types: BTreeSet<DeviceType>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceType) -> Self {
        self.types.insert(kind);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// Timestamps stay unset until the device is first saved.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] if `owner` is missing or empty.
    pub fn build(self) -> Result<Device, HomeMonitorError> {
        let device = Device {
            id: self.id,
            owner: self.owner.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            types: self.types,
            created: None,
            updated: None,
        };
        device.validate()?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;
    use chrono::Duration;

    #[test]
    fn should_build_valid_device_when_owner_provided() {
        let device = Device::builder()
            .owner("alice")
            .description("sensor1")
            .kind(DeviceType::Temperature)
            .build()
            .unwrap();
        assert_eq!(device.owner, "alice");
        assert!(device.id.is_none());
        assert!(device.created.is_none());
        assert!(device.types.contains(&DeviceType::Temperature));
    }

    #[test]
    fn should_return_validation_error_when_owner_is_empty() {
        let result = Device::builder().owner("  ").build();
        assert!(matches!(
            result,
            Err(HomeMonitorError::Validation(ValidationError::EmptyOwner))
        ));
    }

    #[test]
    fn should_set_created_once_and_refresh_updated() {
        let mut device = Device::builder().owner("alice").build().unwrap();
        let first = now();
        device.stamp(first);
        assert_eq!(device.created, Some(first));
        assert_eq!(device.updated, Some(first));

        let later = first + Duration::minutes(5);
        device.stamp(later);
        assert_eq!(device.created, Some(first));
        assert_eq!(device.updated, Some(later));
    }

    #[test]
    fn should_keep_types_as_ordered_set() {
        let json = r#"{"owner":"bob","types":["Motion","Temperature","Motion"]}"#;
        let device: Device = serde_json::from_str(json).unwrap();
        let types: Vec<DeviceType> = device.types.into_iter().collect();
        assert_eq!(types, vec![DeviceType::Temperature, DeviceType::Motion]);
    }

    #[test]
    fn should_use_wire_names_and_timestamp_format() {
        let mut device = Device::builder()
            .id(DeviceId::new(9))
            .owner("alice")
            .build()
            .unwrap();
        device.stamp("2020-01-02T03:04:05Z".parse().unwrap());

        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["id"], 9);
        assert_eq!(value["owner"], "alice");
        assert_eq!(value["created"], "2020-01-02T03:04:05Z");
        assert_eq!(value["updated"], "2020-01-02T03:04:05Z");
    }

    #[test]
    fn should_omit_id_before_first_save() {
        let device = Device::builder().owner("alice").build().unwrap();
        let value = serde_json::to_value(&device).unwrap();
        assert!(value.get("id").is_none());
        assert!(value["created"].is_null());
    }
}
