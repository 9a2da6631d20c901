use serde::{Deserialize, Serialize};

use crate::error::{ContaError, ContaResult};
use crate::models::{Money, Service, ServiceId};

/// Candidate catalog service payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceForm {
    pub id: Option<ServiceId>,
    pub name: String,
    pub value: Money,
}

impl From<Service> for ServiceForm {
    fn from(service: Service) -> Self {
        Self {
            id: Some(service.id),
            name: service.name,
            value: service.value,
        }
    }
}

impl ServiceForm {
    pub fn existing_id(&self) -> Option<ServiceId> {
        self.id.filter(ServiceId::is_valid)
    }

    pub fn validate(self) -> ContaResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ContaError::validation("SERVICE.INVALID_NAME", "name"));
        }
        if !self.value.is_positive() {
            return Err(ContaError::validation("SERVICE.INVALID_VALUE", "value"));
        }

        Ok(Self {
            id: self.existing_id(),
            name,
            value: self.value,
        })
    }
}
